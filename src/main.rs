use anyhow::Context;
use chrono::NaiveDate;
use perfstats::config::Periodicity;
use perfstats::cppi::CppiConfig;
use perfstats::data::ReturnTable;
use perfstats::stochastic::GbmConfig;
use perfstats::stochastic::PathSampler;
use perfstats::StatsConfig;
use perfstats::StatsContext;
use perfstats::VarMode;
use perfstats::Window;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ASSETS: [(&str, f64, f64); 4] = [
  ("Bonds", 3.0, 5.0),
  ("Credit", 5.0, 9.0),
  ("Equity", 8.0, 16.0),
  ("EM", 10.0, 24.0),
];

fn main() -> anyhow::Result<()> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let start = NaiveDate::from_ymd_opt(2015, 1, 2).context("invalid start date")?;
  let mut rng = StdRng::seed_from_u64(2024);

  let mut series = Vec::with_capacity(ASSETS.len());
  for (name, mu, sigma) in ASSETS {
    let cfg = GbmConfig::new(5.0, 1, mu, sigma, Periodicity::Daily, 100.0);
    let paths = cfg.sample_using(&mut rng)?;
    series.push(paths.returns_table(start)?.column_at(0).renamed(name));
  }
  let table = ReturnTable::from_series(&series)?;
  tracing::info!(assets = table.ncols(), periods = table.nrows(), "simulated universe");

  let ctx = StatsContext::new(table, StatsConfig::new("Demo", Periodicity::Daily));
  println!("{}", ctx.summary(&VarMode::ALL));

  let names: Vec<&str> = ASSETS.iter().map(|a| a.0).collect();
  let space = ctx.markowitz_space(&names, 10)?;
  println!("Efficient frontier (annualized):");
  for p in &space.frontier {
    println!("  return {:>7.3}%  vol {:>7.3}%", p.expected_return * 100.0, p.volatility * 100.0);
  }
  println!(
    "Max Sharpe: {:?} (sharpe {:.2})",
    space.max_sharpe.weights.to_vec(),
    space.max_sharpe.sharpe_ratio(ctx.config().risk_free_rate)
  );
  println!("GMV: {:?}", space.global_min_variance.weights.to_vec());

  let cppi_cfg = CppiConfig::new(4.0, 100.0, 0.8, 0.03, Some(0.2), 0.2, Window::all());
  let cppi = ctx.cppi("Equity", None, &cppi_cfg)?;
  println!("CPPI on Equity, 20% drawdown floor:");
  println!("{}", cppi.managed);
  println!("{}", cppi.unconstrained);

  Ok(())
}
