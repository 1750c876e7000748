use semiring_saxpy::{
    min_plus, multiply, multiply_with_config, plan_tasks, plus_times, Mask, Matrix, MultiplyConfig,
    Task,
};

fn main() -> semiring_saxpy::Result<()> {
    println!("semiring-saxpy {}: masked sparse multiplication over semirings", semiring_saxpy::VERSION);

    // A = [1 0 2]    B = [0 1 0]
    //     [0 3 0]        [4 0 0]
    //     [5 0 6]        [0 0 7]
    let a = Matrix::from_triplets(3, 3, &[(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0), (2, 0, 5.0), (2, 2, 6.0)])?;
    let b = Matrix::from_triplets(3, 3, &[(1, 0, 4.0), (0, 1, 1.0), (2, 2, 7.0)])?;

    println!("\nMatrix A:");
    println!("{:?}", a);
    println!("\nMatrix B:");
    println!("{:?}", b);

    let config = MultiplyConfig::default();
    println!("\nDefault configuration:");
    println!("  Threads: {}", config.system_params.n_threads);
    println!("  Minimum task work: {}", config.min_task_work);
    println!("  Fine split factor: {}", config.fine_split_factor);
    println!("  Dense accumulator fraction: {}", config.dense_fraction);

    let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &config);
    println!("\nTask plan ({} units of work, target {}):", plan.total_work, plan.target);
    for task in &plan.tasks {
        match task {
            Task::Coarse { columns } => println!("  coarse columns {:?}", columns),
            Task::Fine { column, entries, work, .. } => {
                println!("  fine column {} entries {:?} work {}", column, entries, work)
            }
        }
    }

    let c = multiply(&a, &b, &plus_times(), None)?;
    println!("\nC = A +.* B:");
    println!("{:?}", c);

    let eye = Matrix::identity(3, ());
    let mask = Mask::structural(&eye, true)?;
    let off_diagonal = multiply_with_config(&a, &b, &plus_times(), Some(&mask), &config)?;
    println!("\nC<!I> = A +.* B:");
    println!("{:?}", off_diagonal);

    let paths = multiply(&a, &a, &min_plus(), None)?;
    println!("\nTwo-hop shortest paths over A:");
    println!("{:?}", paths);

    Ok(())
}
