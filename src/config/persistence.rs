//! File persistence configuration.
//!
//! Every path is relative to the working directory handed to a command
//! (`--dir`, default `.`).

/// Chart outputs of the two Bitcoin pipelines.
pub struct BitcoinPersistenceConfig {
    pub basic_chart: &'static str,
    pub deep_chart: &'static str,
}

/// Exercise tracker files. All live inside `directory`.
pub struct ExercisePersistenceConfig {
    pub directory: &'static str,
    pub routines_file: &'static str,
    pub records_file: &'static str,
    pub heatmap_chart: &'static str,
    pub intensity_chart: &'static str,
    pub volume_chart: &'static str,
    pub adherence_chart: &'static str,
    pub weekly_chart: &'static str,
}

/// Traffic pipeline inputs and outputs.
pub struct TrafficPersistenceConfig {
    /// Raw exports live in every directory starting with this prefix.
    pub raw_dir_prefix: &'static str,
    pub processed_csv: &'static str,
    pub web_dir: &'static str,
    pub web_data_dir: &'static str,
    pub result_json: &'static str,
    pub speed_density_chart: &'static str,
    pub weekly_pattern_chart: &'static str,
}

/// The Master Persistence Configuration
pub struct PersistenceConfig {
    pub bitcoin: BitcoinPersistenceConfig,
    pub exercise: ExercisePersistenceConfig,
    pub traffic: TrafficPersistenceConfig,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    bitcoin: BitcoinPersistenceConfig {
        basic_chart: "bitcoin_basic_result.png",
        deep_chart: "bitcoin_deep_result.png",
    },
    exercise: ExercisePersistenceConfig {
        directory: "exercise_app",
        routines_file: "routines.json",
        records_file: "records.csv",
        heatmap_chart: "weekday_heatmap.png",
        intensity_chart: "intensity_trend.png",
        volume_chart: "stacked_volume.png",
        adherence_chart: "monthly_adherence.png",
        weekly_chart: "weekly_progress.png",
    },
    traffic: TrafficPersistenceConfig {
        raw_dir_prefix: "VDS_",
        processed_csv: "data/processed/jc_filtered_data.csv",
        web_dir: "web",
        web_data_dir: "web/data",
        result_json: "analysis_result.json",
        speed_density_chart: "speed_density.png",
        weekly_pattern_chart: "weekly_pattern.png",
    },
};
