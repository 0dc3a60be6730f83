use devsim::{Machine, Simulator};
use testing::logger;

#[test]
fn test_simulation_logs() -> eyre::Result<()> {
    logger::LoggerBuilder::default()
        .level(log::LevelFilter::Trace)
        .target("devsim")
        .init()?;

    let mut builder = Simulator::builder();
    let press = builder.add_model(Machine::press());
    builder
        .route_input_to(press)
        .take_output_from(press)
        .add_input(1.0, String::from("2"))
        .add_input(2.0, String::from("1"))
        .add_input(2.0, String::from("3"));
    let trace = builder.build()?.simulate()?;
    assert_eq!(trace.len(), 5);

    let logs = logger::clear()?;
    assert!(logs
        .iter()
        .any(|line| line.starts_with("[WARN]") && line.contains("overwritten")));
    assert!(logs
        .iter()
        .any(|line| line.starts_with("[TRACE]") && line.contains("merged into confluent")));
    assert!(logs
        .iter()
        .any(|line| line.starts_with("[INFO]") && line.contains("halted after")));
    Ok(())
}
