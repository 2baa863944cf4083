use lib::error::Result;
use lib::output_log::append_info_to_yaml;
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct ResultInfo {
    makespan: i64,
    score: f64,
    result: bool,
}

pub fn dump_greedy_result_to_file(
    file_path: &str,
    makespan: i64,
    score: f64,
    result: bool,
) -> Result<()> {
    let result_info = ResultInfo {
        makespan,
        score,
        result,
    };
    let yaml = serde_yaml::to_string(&result_info)?;
    append_info_to_yaml(file_path, &yaml)
}
