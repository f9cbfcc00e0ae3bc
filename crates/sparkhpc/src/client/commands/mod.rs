pub mod bootstrap;
pub mod connect;
pub mod list;
pub mod start;
pub mod stop;
pub mod submit;

/// Helper macro for generating CLI help for a `Duration` value given in the "humantime" format.
macro_rules! duration_doc {
    ($text:expr) => {
        concat!(
            $text,
            "\n\n",
            r#"The duration uses the "humantime" format.
For example:
- 30s => 30 seconds
- 10m => 10 minutes
- 1h 30m => 1 hour, 30 minutes"#
        )
    };
}

pub(crate) use duration_doc;
