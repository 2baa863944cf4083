use crate::error::Result;
use crate::scheduling_context::SchedulingContext;

use chrono::{DateTime, Utc};
use log::info;
use std::fs::{self, OpenOptions};
use std::io::Write;

pub fn create_yaml_file(folder_path: &str, file_name: &str) -> Result<String> {
    if fs::metadata(folder_path).is_err() {
        fs::create_dir_all(folder_path)?;
        info!("Created folder: {}", folder_path);
    }
    let file_path = format!("{}/{}.yaml", folder_path, file_name);
    fs::File::create(&file_path)?;
    Ok(file_path)
}

/// Create `<folder_path>/<UTC timestamp>-<alg_name>-result.yaml`.
pub fn create_scheduler_log_yaml_file(folder_path: &str, alg_name: &str) -> Result<String> {
    let now: DateTime<Utc> = Utc::now();
    let date = now.format("%Y-%m-%d-%H-%M-%S").to_string();
    let file_name = format!("{}-{}-result", date, alg_name);
    create_yaml_file(folder_path, &file_name)
}

pub fn append_info_to_yaml(file_path: &str, info: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(file_path)?;
    file.write_all(info.as_bytes())?;
    Ok(())
}

/// Write one `taskId startTime machineId diskId` line per task, in input order.
/// Unassigned machines or disks are written as `-1`.
pub fn write_schedule(writer: &mut impl Write, context: &SchedulingContext) -> Result<()> {
    let dag = &context.dag;
    let resources = &context.resources;
    for node_i in dag.node_indices() {
        let task = &dag[node_i];
        let machine_id = task
            .machine
            .map_or(-1, |machine_i| resources.machine(machine_i).id());
        let disk_id = task.disk.map_or(-1, |disk_i| resources.disk(disk_i).id());
        writeln!(
            writer,
            "{} {} {} {}",
            task.id, task.start_time, machine_id, disk_id
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance_creator::create_context_from_str;
    use std::fs::remove_file;

    #[test]
    fn test_write_schedule_normal() {
        let mut context =
            create_context_from_str("2\n1 10 5 1 1\n2 4 3 1 1\n1\n1 2\n1\n1 5 100\n1\n1 2\n0\n")
                .unwrap();
        let task_2 = context.find_task(2).unwrap();
        context.dag[task_2].start_time = 6;
        context.dag[task_2].machine = context.resources.find_machine(1);
        context.dag[task_2].disk = context.resources.find_disk(1);

        let mut output = Vec::new();
        write_schedule(&mut output, &context).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "1 0 -1 -1\n2 6 1 1\n");
    }

    #[test]
    fn test_append_info_to_yaml_normal() {
        let file_path = create_yaml_file("../outputs", "test_append_info_to_yaml_normal").unwrap();
        append_info_to_yaml(&file_path, "a: 1\n").unwrap();
        append_info_to_yaml(&file_path, "b: 2\n").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "a: 1\nb: 2\n");
        remove_file(file_path).unwrap();
    }

    #[test]
    fn test_create_scheduler_log_yaml_file_name() {
        let file_path =
            create_scheduler_log_yaml_file("../outputs", "test_create_scheduler_log").unwrap();
        assert!(file_path.starts_with("../outputs/"));
        assert!(file_path.ends_with("-test_create_scheduler_log-result.yaml"));
        remove_file(file_path).unwrap();
    }
}
