//! CLI Doctor Command
//!
//! Checks that each recognition engine can actually run.

use anyhow::Result;
use scanchat_config::ScanChatConfig;
use scanchat_core::{CredentialSlot, ENGINES};
use tokio::process::Command;

pub async fn run(config: &ScanChatConfig) -> Result<()> {
    println!("\n🔍 Running ScanChat Doctor...\n");

    let local_ok = check_tesseract(config).await;
    check_credentials(config);

    println!();
    if local_ok {
        println!("✅ Local OCR is available.");
    } else {
        println!("❌ Local OCR is unavailable; install tesseract or set local.tesseractPath.");
    }
    Ok(())
}

async fn check_tesseract(config: &ScanChatConfig) -> bool {
    println!("Checking tesseract:");
    let program = config.tesseract_path();
    match Command::new(program).arg("--version").output().await {
        Ok(output) if output.status.success() => {
            // Newer releases print the banner on stdout, older ones on stderr.
            let banner = if output.stdout.is_empty() { &output.stderr } else { &output.stdout };
            let version = String::from_utf8_lossy(banner);
            println!("  🟢 {}", version.lines().next().unwrap_or(program));
            println!("  🟢 languages: {}", config.tesseract_languages());
            true
        }
        Ok(output) => {
            println!("  🔴 {program} exited with {}", output.status);
            false
        }
        Err(e) => {
            println!("  🔴 {program} could not be started: {e}");
            false
        }
    }
}

fn check_credentials(config: &ScanChatConfig) {
    println!("Checking API keys:");
    let credentials = config.credentials();
    for slot in [CredentialSlot::OpenAi, CredentialSlot::Gemini] {
        let users: Vec<&str> = ENGINES
            .iter()
            .filter(|e| e.credential_slot == Some(slot))
            .map(|e| e.name)
            .collect();
        let users = if slot == CredentialSlot::OpenAi {
            format!("{}, chat", users.join(", "))
        } else {
            users.join(", ")
        };
        match credentials.get(slot) {
            Some(key) if slot.is_well_formed(key) => println!("  🟢 {slot} key set ({users})"),
            Some(_) => println!("  🟡 {slot} key looks unusual; the provider will decide ({users})"),
            None => println!("  🟡 {slot} key missing (optional; needed for {users})"),
        }
    }
}
