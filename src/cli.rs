mod args;

pub use args::{ApplyArgs, Cli, Command, ConnectionArgs, PlanArgs, TargetArgs};
