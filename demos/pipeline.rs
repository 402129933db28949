use console::style;
use tsumiki::{
    ArrayData, ArtifactKind, History, MemorySession, Param, Registry, RemoveArtifact, Session,
    UpdateStep, Workflow,
};

/// This example walks through a small image processing session.
///
/// It shows how to:
/// 1. Register the operations a session can record.
/// 2. Record steps as artifacts get produced.
/// 3. Ask the workflow what depends on what.
/// 4. Undo and redo edits.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tsumiki=debug"))
        .init();

    // -----------------------------------------------------------------------
    // 1. Operations
    // -----------------------------------------------------------------------
    let mut registry = Registry::new();
    let blur = registry.register("gaussian_blur", ["image", "sigma"], ArtifactKind::Image)?;
    let threshold = registry.register("threshold_otsu", ["image"], ArtifactKind::Labels)?;
    let label = registry.register("connected_components", ["binary_image"], ArtifactKind::Labels)?;

    // -----------------------------------------------------------------------
    // 2. The live side. In a real application these would be viewer layers.
    // -----------------------------------------------------------------------
    let mut session = MemorySession::new();
    session.insert("nuclei", ArrayData::new(vec![2, 2], vec![0.0, 9.0, 8.0, 1.0]));

    let mut workflow = Workflow::new();
    let mut history = History::new();

    let steps = [
        ("blurred", blur, vec![Param::artifact("nuclei"), Param::value(2.0), Param::Context]),
        ("binary", threshold, vec![Param::artifact("blurred")]),
        ("labels", label, vec![Param::artifact("binary")]),
    ];

    for (target, operation, params) in steps {
        session.insert(target, ArrayData::new(vec![2, 2], vec![0.0; 4]));
        let step = UpdateStep::new(&workflow, target, operation, params);
        print!("{step}");
        history.execute(&step, &mut workflow, &mut session)?;
    }

    // -----------------------------------------------------------------------
    // 3. Queries
    // -----------------------------------------------------------------------
    println!("{} {:?}", style("roots:").blue(), workflow.roots());
    println!(
        "{} {:?}",
        style("downstream of blurred:").blue(),
        workflow.followers_of("blurred")
    );
    println!("{workflow}");

    // -----------------------------------------------------------------------
    // 4. Undo and redo
    // -----------------------------------------------------------------------
    session.remove("binary");
    let removal = RemoveArtifact::new(&workflow, "binary");
    history.execute(&removal, &mut workflow, &mut session)?;
    println!("{} {:?}", style("after removal:").red(), workflow.keys().collect::<Vec<_>>());

    history.undo_into(&mut workflow);
    println!("{} {:?}", style("after undo:").green(), workflow.keys().collect::<Vec<_>>());

    history.redo_into(&mut workflow);
    println!("{} {:?}", style("after redo:").green(), workflow.keys().collect::<Vec<_>>());

    println!(
        "{} {} undo / {} redo, {} live artifacts",
        style("history:").blue(),
        history.undo_len(),
        history.redo_len(),
        session.artifact_names().len()
    );

    Ok(())
}
