use std::path::Path;

use anyhow::Result;
use font_feature_freezer::CATALOG;
use maple_core::ConfigModel;

/// Print the feature catalog with each feature's configured policy.
pub fn features(config: &Path) -> Result<()> {
    let config = ConfigModel::load(config)?;
    println!("{:<6}{:<12}{:<8}Description", "Tag", "Kind", "Policy");
    for entry in CATALOG {
        let policy = if entry.tag.is_calt() {
            "-"
        } else {
            config.feature_freeze.get(entry.tag).as_str()
        };
        let kind = format!("{:?}", entry.kind);
        println!("{:<6}{kind:<12}{policy:<8}{}", entry.tag.as_str(), entry.description);
    }
    Ok(())
}
