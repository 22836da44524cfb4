use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "PIX_HOST",
        "PIX_PORT",
        "PIX_MP_API_URL",
        "PIX_PROCESSOR_TIMEOUT",
        "PIX_NOTIFICATION_URL",
        "PIX_STORE_NAME",
        "PIX_PAYER_EMAIL",
        "PIX_PAYER_FIRST_NAME",
        "PIX_PAYER_LAST_NAME",
        "PIX_MINIMUM_DEPOSIT",
        "PIX_UNPAID_DEPOSIT_TIMEOUT",
        "PIX_CLOSED_DEPOSIT_RETENTION",
        "PIX_WEBHOOK_SIGNATURE_CHECKS",
        "PIX_EVENT_BUFFER_SIZE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
