macro_rules! create_sparkhpc_env {
    ($name: literal) => {
        concat!("SPARKHPC_", $name)
    };
}

/// Installation directory of Spark. It has to be set when a cluster is submitted.
pub const SPARK_HOME: &str = "SPARK_HOME";
/// Used to limit the scheduler job listing to the current user.
pub const USER: &str = "USER";

/// Known environment variables
pub const SPARKHPC_DIR: &str = create_sparkhpc_env!("DIR");
pub const SPARKHPC_SCHEDULER: &str = create_sparkhpc_env!("SCHEDULER");
pub const SPARKHPC_CONFIG: &str = create_sparkhpc_env!("CONFIG");
pub const SPARKHPC_OUTPUT_MODE: &str = create_sparkhpc_env!("OUTPUT_MODE");
pub const SPARKHPC_DEBUG: &str = create_sparkhpc_env!("DEBUG");

/// Reads an environment variable, treating an empty value as unset.
pub fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
