//! Final report printing.

use acquisition::AcquisitionReport;

/// Print detailed summary
pub fn print_report(report: &AcquisitionReport) {
    let s = &report.stats;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Acquisition Statistics                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Overview");
    println!("   ├─ Duration: {:.1}s", report.duration.as_secs_f64());
    println!("   ├─ Readings: {}", s.readings);
    println!("   ├─ From device: {}", s.device_readings);
    println!("   ├─ Synthetic: {}", s.synthetic_readings);
    println!("   ├─ Rate: {:.2}/min", report.rate_per_minute());
    println!("   └─ Errors: {}", s.errors);

    println!("\n💾 Storage");
    println!("   ├─ Persisted: {}", s.persisted);
    println!("   ├─ Failures: {}", s.persist_failures);
    match report.stored_records {
        Some(n) => println!("   └─ Records in store: {n}"),
        None => println!("   └─ Records in store: unknown"),
    }

    println!("\n📣 Notifications");
    println!("   ├─ Sent: {}", s.notifications_sent);
    println!("   ├─ Failed: {}", s.notification_failures);
    println!("   └─ Suppressed by throttle: {}", s.notifications_suppressed);

    let r = &report.replicator;
    println!("\n☁️  Remote replicator");
    if r.enabled {
        if let Some(endpoint) = &r.endpoint {
            println!("   ├─ Endpoint: {endpoint}");
        }
        println!("   ├─ Successful: {}", r.successful_count);
        println!("   ├─ Failed: {}", r.failed_count);
        match &r.last_error {
            Some(error) => println!("   └─ Last error: {error}"),
            None => println!("   └─ Last error: none"),
        }
    } else {
        println!("   └─ Disabled");
    }

    if report.summary.total_readings > 0 {
        println!("\n📈 Readings");
        println!("   ├─ Temperature (°C): {}", report.summary.temperature);
        println!("   ├─ Humidity (%): {}", report.summary.humidity);
        println!("   └─ Heat index (°C): {}", report.summary.heat_index);
    }

    println!();
}
