use rollwatch_core::Labeller;

/// Print the selector deploy tooling should label workloads with.
pub fn labels(run_id: Option<&str>) -> anyhow::Result<()> {
    let labeller = Labeller::new(run_id.unwrap_or_default());
    println!("{}", labeller.selector());
    Ok(())
}
