use anyhow::Result;
use std::path::PathBuf;

use crate::config::FireOpsConfig;
use crate::store::{Snapshot, SnapshotLock};

pub struct InitCommand {
    pub data: PathBuf,
    pub force: bool,
    pub write_config: bool,
}

impl InitCommand {
    pub async fn execute(&self, config: &FireOpsConfig) -> Result<()> {
        if self.write_config {
            config.save_to_file("fireops.toml")?;
            println!("📝 Wrote configuration to fireops.toml");
        }

        if self.data.exists() && !self.force {
            println!("✅ Snapshot already exists at {}", self.data.display());
            println!("   Use --force to start over with an empty snapshot");
            return Ok(());
        }

        let mut lock = SnapshotLock::open(&self.data)?;
        let _guard = lock.acquire()?;
        Snapshot::empty().save(&self.data).await?;
        println!("✅ Created empty snapshot at {}", self.data.display());
        Ok(())
    }
}
