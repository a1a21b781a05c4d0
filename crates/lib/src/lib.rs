//! testpojo-lib: launcher for the reflective POJO test engine
//!
//! This crate runs the POJO test engine in a child JVM at test time:
//! - `argline`: renders the `argLine` property into JVM arguments
//! - `classpath`: resolves the engine class path into absolute locations
//! - `artifact`: writes the manifest-only `testPojo.jar`
//! - `dependencies`: writes the dependency hand-off file
//! - `supervisor`: runs the engine and streams its output
//! - `report`: interprets the engine's exit status
//! - `launch`: the pipeline tying them together

pub mod argline;
pub mod artifact;
pub mod classpath;
pub mod consts;
pub mod dependencies;
pub mod launch;
pub mod placeholder;
pub mod properties;
pub mod report;
pub mod supervisor;
pub mod util;
