use std::path::Path;

use anyhow::{Result, bail};

use crate::{
    analysis::{
        route_sim::{
            BprParams, SimulationResult, equilibrium_split, simulate, sweep_splits,
            system_optimum_split,
        },
        traffic::{
            GreenshieldsParams, daily_speed_stats, fit_greenshields, fit_points, load_summary,
            save_summary, weekly_pattern,
        },
    },
    config::PERSISTENCE,
    data::{VdsLoadReport, load_processed, load_vds_dir, save_processed},
    report::traffic::{daily_speed_table, draw_speed_density, draw_weekly_pattern, route_table},
};

/// Merge every VDS export under `raw_dir` and write the processed junction CSV under `base`.
pub fn traffic_load(base: &Path, raw_dir: &Path) -> Result<VdsLoadReport> {
    let cfg = &PERSISTENCE.traffic;
    let report = load_vds_dir(raw_dir, cfg.raw_dir_prefix)?;
    if report.files_found == 0 {
        bail!(
            "no VDS files found under {}/{}*",
            raw_dir.display(),
            cfg.raw_dir_prefix
        );
    }

    println!(
        "Merged rows: {} from {} of {} files",
        report.merged_rows,
        report.files_found - report.skipped.len(),
        report.files_found
    );
    for (path, reason) in &report.skipped {
        println!("  skipped {}: {}", path.display(), reason);
    }
    if report.records.is_empty() {
        log::warn!("No rows matched the target junctions");
    }

    let out = base.join(cfg.processed_csv);
    save_processed(&out, &report.records)?;
    println!(
        "Final rows: {} (saved to {})",
        report.records.len(),
        out.display()
    );
    Ok(report)
}

/// Weekday stats, both charts, the Greenshields fit and its JSON summary.
pub fn traffic_analyze(base: &Path, charts: bool) -> Result<GreenshieldsParams> {
    let cfg = &PERSISTENCE.traffic;
    let input = base.join(cfg.processed_csv);
    if !input.exists() {
        log::error!("{} not found", input.display());
        bail!("processed data is missing, run traffic-load first");
    }

    let records = load_processed(&input)?;
    log::info!("Loaded {} processed rows", records.len());

    let stats = daily_speed_stats(&records);
    println!("[Average speed by weekday]");
    println!("{}", daily_speed_table(&stats));
    if let (Some(slow), Some(fast)) = (stats.slowest(), stats.fastest()) {
        println!("Slowest: {} ({:.1} km/h)", slow.0, slow.1);
        println!("Fastest: {} ({:.1} km/h)", fast.0, fast.1);
    }

    let fit = fit_greenshields(&records)?;
    if charts {
        let web = base.join(cfg.web_dir);
        draw_speed_density(
            &web.join(cfg.speed_density_chart),
            &fit_points(&records),
            &fit,
        )?;
        draw_weekly_pattern(&web.join(cfg.weekly_pattern_chart), &weekly_pattern(&records))?;
    }

    println!("\n[Greenshields model]");
    println!("uf {:.1} km/h", fit.free_flow_speed);
    println!("kj {:.1} veh/km", fit.jam_density);
    println!("C {:.0} veh/h", fit.capacity);

    let json = base.join(cfg.web_data_dir).join(cfg.result_json);
    save_summary(&json, &fit.summary())?;
    println!("Summary saved to {}", json.display());
    Ok(fit)
}

/// BPR parameters from the analysis summary when one exists, else the defaults.
pub fn route_params(base: &Path, summary: Option<&Path>) -> Result<BprParams> {
    let cfg = &PERSISTENCE.traffic;
    if let Some(path) = summary {
        return Ok(BprParams::from(&load_summary(path)?));
    }
    let default_path = base.join(cfg.web_data_dir).join(cfg.result_json);
    if default_path.exists() {
        log::info!("Using fitted parameters from {}", default_path.display());
        return Ok(BprParams::from(&load_summary(&default_path)?));
    }
    log::info!("No analysis summary found, using default parameters");
    Ok(BprParams::default())
}

fn print_result(label: &str, r: &SimulationResult) {
    println!(
        "{}: split A {:.0}% | A {:.0} veh/h {:.1} min | B {:.0} veh/h {:.1} min | system {:.0} veh-min",
        label, r.split_a_pct, r.volume_a, r.time_a, r.volume_b, r.time_b, r.total_system_time
    );
}

pub fn route_sim(
    base: &Path,
    summary: Option<&Path>,
    demand: f64,
    split_a_pct: f64,
    sweep: bool,
) -> Result<SimulationResult> {
    let params = route_params(base, summary)?;
    println!(
        "[BPR route simulation] uf {:.1} km/h, C {:.0} veh/h, demand {:.0} veh/h",
        params.free_flow_speed, params.capacity, demand
    );

    let result = simulate(demand, split_a_pct, &params)?;
    print_result("Scenario", &result);
    println!("{}", result.verdict);

    print_result("User equilibrium", &equilibrium_split(demand, &params)?);
    print_result("System optimum", &system_optimum_split(demand, &params)?);

    if sweep {
        let rows: Vec<SimulationResult> = sweep_splits(demand, &params)?
            .into_iter()
            .step_by(10)
            .collect();
        println!("{}", route_table(&rows));
    }
    Ok(result)
}
