//! Shared constants.

pub const APP_NAME: &str = "testpojo";

/// Executable archive written into the build directory.
pub const ARTIFACT_FILENAME: &str = "testPojo.jar";

/// Dependency hand-off file written into the build directory.
pub const DEPENDENCY_FILENAME: &str = "testPojo.dependencies";

/// Property holding the JVM argument line.
pub const ARG_LINE_PROPERTY: &str = "argLine";

/// Entry point of the reflective POJO test engine.
pub const DEFAULT_MAIN_CLASS: &str = "org.honton.chas.testpojo.Main";

/// Class path used for the engine when none is given explicitly.
pub const ENGINE_CLASSPATH_ENV: &str = "TESTPOJO_ENGINE_CLASSPATH";

/// Overrides the Java program used to launch the engine.
pub const JAVA_ENV: &str = "TESTPOJO_JAVA";

pub const JAVA_HOME_ENV: &str = "JAVA_HOME";
