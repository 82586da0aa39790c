use anyhow::Result;

use mnemo::config::MnemoConfig;
use mnemo::engine::Engine;

/// Print archive statistics.
pub fn stats(config: &MnemoConfig) -> Result<()> {
    let engine = Engine::open(config)?;
    let stats = engine.stats()?;

    println!("Archive statistics");
    println!("==================");
    println!("Total vectors:          {}", stats.total_vectors);
    println!("Index size:             {}", stats.index_size);
    println!("Vector dimension:       {}", stats.dimension);
    println!("Non-vectorized events:  {}", stats.non_vectorized_events);

    if !stats.by_source_type.is_empty() {
        println!();
        println!("Vectors by source type:");
        let mut sources: Vec<_> = stats.by_source_type.iter().collect();
        sources.sort();
        for (source, count) in sources {
            println!("  {source}: {count}");
        }
    }

    Ok(())
}
