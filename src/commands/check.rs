//! `check`: validates the proc and thermal sources and the configuration.

use anyhow::{bail, Result};

use cli_proc_monitor::config::{validate_effective_config, Config};
use cli_proc_monitor::discovery::enumerate_pids;
use cli_proc_monitor::system;
use cli_proc_monitor::temperature::{SysfsThermal, TemperatureSource};
use cli_proc_monitor::ProcReader;

pub fn command_check(proc: bool, thermal: bool, all: bool, config: &Config) -> Result<()> {
    println!("🔍 CLI Process Monitor - System Check");
    println!("=====================================");

    let mut all_ok = true;
    let proc_root = config.proc_root();

    if proc || all {
        println!("\n📁 Checking {} ...", proc_root.display());
        match enumerate_pids(proc_root) {
            Ok(pids) => {
                println!("   ✅ {} process entries readable", pids.len());

                let reader = ProcReader::new(proc_root);
                let target = config.target_name();
                let matching = pids
                    .iter()
                    .filter(|pid| reader.matches_name(**pid, target))
                    .count();
                println!("   ✅ {} running '{}' processes", matching, target);

                let own = reader.read_stat(std::process::id());
                if own.starttime == 0 {
                    println!("   ⚠️  Could not parse stat for own process");
                }
            }
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }

        match system::read_uptime_seconds(proc_root) {
            Ok(uptime) => println!("   ✅ Uptime readable ({:.0}s)", uptime),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
        println!(
            "   ✅ Clock ticks: {}/s, page size: {} bytes",
            system::clock_ticks_per_second(),
            system::page_size()
        );
    }

    if thermal || all {
        println!("\n🌡️  Checking thermal zones...");
        let source = SysfsThermal::new(config.thermal_root());
        let readings = source.readings();
        if readings.is_empty() {
            // Temperature is optional; samples then carry 0.
            println!(
                "   ⚠️  No thermal zones under {}",
                config.thermal_root().display()
            );
        } else {
            for r in &readings {
                println!("   ✅ {}: {:.1}°C", r.label, r.current);
            }
            println!("   ✅ Primary temperature: {:.1}°C", source.primary());
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        bail!("system check failed")
    }
}
