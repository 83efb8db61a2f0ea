//! Demo showing cutting-plane training on a small multiclass problem

use sosvm::api::SoSvm;
use sosvm::core::TrainingExample;
use sosvm::model::MulticlassModel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Multiclass Cutting-Plane Demo ===");

    // Three well-separated classes in 2D
    let examples = vec![
        TrainingExample::new(vec![2.0, 0.2], 0usize),
        TrainingExample::new(vec![1.8, -0.1], 0usize),
        TrainingExample::new(vec![2.2, 0.0], 0usize),
        TrainingExample::new(vec![-2.0, 0.1], 1usize),
        TrainingExample::new(vec![-1.9, -0.2], 1usize),
        TrainingExample::new(vec![-2.1, 0.2], 1usize),
        TrainingExample::new(vec![0.1, 2.0], 2usize),
        TrainingExample::new(vec![-0.1, 1.9], 2usize),
        TrainingExample::new(vec![0.0, 2.2], 2usize),
    ];

    println!("Training data points: {}", examples.len());

    let trained = SoSvm::new()
        .with_c(1.0)
        .with_epsilon(0.001)
        .with_max_iterations(100)
        .train(MulticlassModel::new(2, 3), &examples)?;

    println!("\n--- Training summary ---");
    println!("Sweeps: {}", trained.sweeps());
    println!("Constraints in working set: {}", trained.n_constraints());
    println!("Primal objective: {:.6}", trained.objective());
    println!(
        "Training accuracy: {:.1}%",
        trained.evaluate(&examples) * 100.0
    );

    println!("\n--- Predictions on new points ---");
    for point in [[1.5, 0.0], [-1.5, 0.0], [0.0, 1.5], [0.5, 0.5]] {
        println!("{point:?} -> class {}", trained.predict(&point));
    }

    println!("\n--- Slacks per training example ---");
    for (i, &slack) in trained.slacks().iter().enumerate() {
        println!("example {i}: slack {slack:.6}");
    }

    Ok(())
}
