use anyhow::Result;

use mnemo::config::MnemoConfig;
use mnemo::engine::Engine;

/// Run one similarity search from the terminal.
pub fn search(config: &MnemoConfig, query: &str, top_k: Option<usize>) -> Result<()> {
    let engine = Engine::open(config)?;
    let top_k = top_k.unwrap_or(config.search.default_top_k);

    // Paraphrase generation is an external collaborator; the CLI searches
    // with the literal query only.
    let results = engine.search(query, top_k, None)?;

    if results.is_empty() {
        println!("No results found for '{query}'.");
        println!("Try different phrasing, or run `mnemo sweep` if captures are not vectorized yet.");
        return Ok(());
    }

    println!("Results for '{query}' (distance: lower is closer)\n");
    for (i, hit) in results.iter().enumerate() {
        println!(
            "  {}. #{} [{}] distance {:.3}",
            i + 1,
            hit.event.id,
            hit.event.source_type,
            hit.distance,
        );
        println!("     {}", super::format_timestamp(hit.event.timestamp));
        if let Some(media) = &hit.event.media_path {
            println!("     {media}");
        }
        println!("     {}", super::preview(hit.event.content.as_deref(), 100));
        println!();
    }

    Ok(())
}
