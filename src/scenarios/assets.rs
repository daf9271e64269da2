//! Static image availability

use anyhow::Result;
use tracing::warn;

use super::ScenarioContext;
use crate::models::{CheckRecord, CheckStatus};

/// Every configured image path must answer 200 with an `image/*` type
pub async fn image_assets(ctx: &mut ScenarioContext) -> Result<bool> {
    let paths = ctx.image_paths.clone();
    let mut passed = 0;

    for path in &paths {
        println!("🔍 Testing image: {path}");
        let name = format!("Image {path}");
        let target = format!("GET {path}");

        let record = match ctx.session.fetch(path).await {
            Ok(response) => {
                let content_type = response.content_type().unwrap_or_default().to_string();
                let record = CheckRecord::new(&name, &target, CheckStatus::Pass)
                    .with_statuses(200, Some(response.status_code))
                    .with_duration(response.duration_ms);

                if response.status_code == 200 && content_type.starts_with("image/") {
                    passed += 1;
                    println!(
                        "✓ Image accessible - Status: {}, Content-Type: {}",
                        response.status_code, content_type
                    );
                    record
                } else {
                    println!(
                        "✗ Image not accessible - Status: {}, Content-Type: {}",
                        response.status_code, content_type
                    );
                    let mut record = record.with_message(format!(
                        "status {}, content type '{}'",
                        response.status_code, content_type
                    ));
                    record.status = CheckStatus::Fail;
                    record
                }
            }
            Err(e) => {
                println!("✗ Error accessing image: {e}");
                warn!("Image {} errored: {}", path, e);
                CheckRecord::new(&name, &target, CheckStatus::Error)
                    .with_statuses(200, None)
                    .with_message(e.to_string())
            }
        };
        ctx.session.tally_mut().record(record);
    }

    println!("\n📊 Image tests passed: {}/{}", passed, paths.len());
    Ok(true)
}
