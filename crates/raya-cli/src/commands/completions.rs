//! `raya completions` — Generate shell completions.

pub fn execute(shell: String) -> anyhow::Result<()> {
    match shell.as_str() {
        "bash" | "zsh" | "fish" | "powershell" => {
            println!("Generating {} completions...", shell);
            eprintln!("(Not yet implemented)");
        }
        _ => {
            eprintln!("Unknown shell: {}. Supported: bash, zsh, fish, powershell", shell);
            std::process::exit(1);
        }
    }
    Ok(())
}
