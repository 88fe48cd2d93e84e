// pagekit-eval: evaluation harness for browser-automation scenarios
// Plan generation -> bounded scheduling -> scoring -> summary -> gate
// Scenario bodies are content; everything else here is the engine.

pub mod config;
pub mod gate;
pub mod outcome;
pub mod plan;
pub mod registry;
pub mod runner;
pub mod scenarios;
pub mod scheduler;
pub mod scorer;
pub mod summary;
