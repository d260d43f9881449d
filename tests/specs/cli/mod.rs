mod help;
mod registry;
mod workflow_run;
