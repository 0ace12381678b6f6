pub mod agent;
pub mod capability;
pub mod context;
pub mod crews;
pub mod graph;
pub mod invoker;
pub mod outlet;
pub mod prompt;
pub mod result;
pub mod scheduler;
pub mod task;
pub mod template;
pub mod workflow;
