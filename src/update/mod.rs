//! Self-update check: compare the installed version with the published
//! manifest and open the download link for newer releases.
pub mod manifest;
pub mod updater;
pub mod version;

pub use manifest::{version_file_candidates, LocalVersion, VERSION_FILE};
pub use updater::{UpdateInfo, UpdateStatus, Updater};
