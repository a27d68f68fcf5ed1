//! File naming conventions for staged and installed artifacts.
//!
//! All other modules should use these functions rather than building names
//! directly, so the staging lookup used for download reuse stays consistent
//! with the pipeline that writes the file.

/// Extension of installed artifacts.
const ARTIFACT_EXTENSION: &str = "apk";

/// Staging file name for a package.
///
/// There is exactly one staging slot per package; only one pipeline per
/// package can be active, so the slot is never written concurrently.
///
/// # Examples
///
/// ```
/// use lellostore::package::staging_filename;
///
/// assert_eq!(staging_filename("com.test.app"), "com.test.app.download");
/// ```
pub fn staging_filename(package_name: &str) -> String {
    format!("{}.download", package_name)
}

/// File name of an installed artifact.
///
/// Characters that are not safe in file names are replaced by `_`.
///
/// # Examples
///
/// ```
/// use lellostore::package::installed_filename;
///
/// assert_eq!(installed_filename("com.test.app", "1.2.0"), "com.test.app-1.2.0.apk");
/// assert_eq!(installed_filename("com.test.app", "1.0 beta/2"), "com.test.app-1.0_beta_2.apk");
/// ```
pub fn installed_filename(package_name: &str, version_name: &str) -> String {
    let version: String = version_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}.{}", package_name, version, ARTIFACT_EXTENSION)
}
