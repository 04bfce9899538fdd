use anyhow::Result;
use chrono::Utc;
use console::style;
use linkpost_browser::SessionStore;
use linkpost_core::Config;

/// Summarise the saved session without printing cookie values
pub fn show(config: &Config) -> Result<()> {
    let store = SessionStore::new(config.session_path());
    let state = store.load();

    if state.is_empty() {
        println!("No saved session ({})", store.path().display());
        return Ok(());
    }

    let now = Utc::now().timestamp() as f64;
    let expired = state
        .cookies
        .iter()
        .filter(|c| !c.is_session() && c.expires <= now)
        .count();

    println!("{}", style(store.path().display()).bold());
    match state.saved_at {
        Some(saved_at) => println!("Saved:    {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Saved:    unknown"),
    }
    println!(
        "Cookies:  {} ({} expired)",
        state.cookies.len(),
        expired
    );
    println!("Origins:  {}", state.origins.len());

    let domains = state.cookie_domains();
    if !domains.is_empty() {
        println!("Domains:");
        for domain in domains {
            println!("  {}", domain);
        }
    }

    Ok(())
}

/// Delete the session file
pub fn clear(config: &Config) -> Result<()> {
    let store = SessionStore::new(config.session_path());
    if store.clear()? {
        println!(
            "{} Session cleared; the next run will sign in again",
            style("✓").green()
        );
    } else {
        println!("No saved session to clear.");
    }
    Ok(())
}
