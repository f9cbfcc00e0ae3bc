use std::path::Path;

use crate::Map;
use crate::cluster::descriptor::JobDescriptor;
use crate::common::utils::size::format_memory_mb;
use crate::scheduler::SchedulerAdapter;

/// Values substituted into a job script template.
pub struct TemplateValues<'a> {
    pub spark_home: &'a Path,
    /// Executable that bootstraps the cluster inside the allocation
    pub launcher: &'a Path,
}

pub fn build_template_variables(
    descriptor: &JobDescriptor,
    adapter: &dyn SchedulerAdapter,
    values: &TemplateValues,
) -> Map<&'static str, String> {
    let mut variables = Map::new();
    variables.insert("walltime", adapter.format_walltime(&descriptor.walltime));
    variables.insert("ncores", descriptor.requested_cores.to_string());
    variables.insert("cores_per_executor", descriptor.cores_per_worker.to_string());
    variables.insert("number_of_executors", descriptor.worker_count().to_string());
    variables.insert(
        "memory_per_core",
        adapter.format_memory(descriptor.memory_per_core),
    );
    variables.insert(
        "memory_per_executor",
        format_memory_mb(descriptor.memory_per_worker),
    );
    variables.insert("driver_memory", format_memory_mb(descriptor.driver_memory));
    variables.insert("jobname", descriptor.job_name.clone());
    variables.insert("spark_home", values.spark_home.display().to_string());
    variables.insert("launcher", values.launcher.display().to_string());
    variables.insert(
        "workdir",
        descriptor.working_directory.display().to_string(),
    );
    variables.insert(
        "extra_scheduler_options",
        descriptor.extra_scheduler_options.clone(),
    );
    variables
}

/// Replaces `{name}` placeholders in `template`.
/// `{{` and `}}` produce literal braces, an unknown placeholder is an error.
pub fn render_template(template: &str, variables: &Map<&str, String>) -> crate::Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(crate::Error::TemplateError(format!(
                        "unterminated placeholder at offset {position}"
                    )));
                }
                match variables.get(name.as_str()) {
                    Some(value) => output.push_str(value),
                    None => {
                        return Err(crate::Error::TemplateError(format!(
                            "unknown placeholder `{{{name}}}`"
                        )));
                    }
                }
            }
            '}' => {
                return Err(crate::Error::TemplateError(format!(
                    "unmatched `}}` at offset {position}"
                )));
            }
            c => output.push(c),
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{TemplateValues, build_template_variables, render_template};
    use crate::Error;
    use crate::Map;
    use crate::cluster::descriptor::{ClusterParamsBuilder, JobDescriptor};
    use crate::common::utils::time::Walltime;
    use crate::scheduler::lsf::LsfAdapter;
    use crate::scheduler::slurm::SlurmAdapter;
    use crate::scheduler::{SchedulerAdapter, SchedulerKind};
    use std::path::{Path, PathBuf};

    fn variables() -> Map<&'static str, String> {
        let mut variables = Map::new();
        variables.insert("ncores", "4".to_string());
        variables.insert("jobname", "spark".to_string());
        variables
    }

    fn descriptor(kind: SchedulerKind) -> JobDescriptor {
        let params = ClusterParamsBuilder::default()
            .cores(8)
            .cores_per_executor(2)
            .memory_per_core(1024)
            .walltime(Walltime::from_minutes(90))
            .job_name("spark")
            .build()
            .unwrap();
        JobDescriptor::new(params, kind, PathBuf::from("/scratch/user")).unwrap()
    }

    fn render_default(adapter: &dyn SchedulerAdapter) -> String {
        let descriptor = descriptor(adapter.kind());
        let values = TemplateValues {
            spark_home: Path::new("/opt/spark"),
            launcher: Path::new("/usr/bin/sparkcluster"),
        };
        let variables = build_template_variables(&descriptor, adapter, &values);
        render_template(adapter.default_template(), &variables).unwrap()
    }

    #[test]
    fn test_render_placeholders() {
        let output = render_template("#BSUB -n {ncores} -J {jobname}", &variables()).unwrap();
        assert_eq!(output, "#BSUB -n 4 -J spark");
    }

    #[test]
    fn test_render_escaped_braces() {
        let output = render_template("echo ${{HOME}} {ncores}", &variables()).unwrap();
        assert_eq!(output, "echo ${HOME} 4");
    }

    #[test]
    fn test_render_unknown_placeholder() {
        assert!(matches!(
            render_template("{cores}", &variables()),
            Err(Error::TemplateError(_))
        ));
    }

    #[test]
    fn test_render_unterminated() {
        assert!(render_template("{ncores", &variables()).is_err());
        assert!(render_template("ncores}", &variables()).is_err());
    }

    #[test]
    fn test_render_lsf_default_template() {
        let script = render_default(&LsfAdapter::new(None));
        insta::assert_snapshot!(script, @r#"
        #!/bin/bash
        #BSUB -J spark
        #BSUB -W 01:30
        #BSUB -n 8
        #BSUB -R "rusage[mem=1024]"
        #BSUB -o spark-%J.log
        #BSUB -cwd /scratch/user


        export SPARK_HOME=/opt/spark

        /usr/bin/sparkcluster start-cluster \
            --scheduler lsf \
            --executors 4 \
            --cores-per-executor 2 \
            --memory-per-executor 2048M
        "#);
    }

    #[test]
    fn test_render_slurm_default_template() {
        let script = render_default(&SlurmAdapter::new(None));
        assert!(script.contains("#SBATCH --time=90\n"));
        assert!(script.contains("#SBATCH --ntasks=4\n"));
        assert!(script.contains("#SBATCH --mem-per-cpu=1024M\n"));
        assert!(script.contains("#SBATCH --output=spark-%j.log\n"));
        assert!(script.contains("--memory-per-executor 2048M"));
    }
}
