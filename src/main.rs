mod input;
mod opts;
mod output;

use std::collections::BTreeMap;
use std::process;

use radee_common::{Cancellation, Sequencer};
use radee_common::clock::SystemClock;
use radee_common::config::AcquisitionConfig;
use radee_common::io::{BusInterface, RpiBus};
use radee_common::output::{QueuedSink, SampleSink, SinkSet};
use radee_common::sequencer::RunSummary;
use radee_common::sim::SimulatedBus;

use crate::output::SampleLimit;
use crate::output::console::ConsoleSink;
use crate::output::csv::CSVSampleWriter;

fn main() {
    let opts = match opts::parse() {
        Ok(opts) => opts,
        Err(opts::Error::Help(usage)) => {
            println!("{}", usage);
            process::exit(1);
        },
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        },
    };

    tracing_subscriber::fmt()
        .with_max_level(opts.log_level())
        .with_writer(std::io::stderr)
        .init();

    let config = match opts.get_config_reader().read() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to read configuration: {}", e);
            process::exit(1);
        },
    };
    print!("{}\n", config);

    let cancel = Cancellation::new();
    let handler_cancel = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_cancel.cancel()) {
        eprintln!("error: could not install interrupt handler: {}", e);
        process::exit(1);
    }

    let mut sinks = SinkSet::new();
    if opts.echo() {
        sinks.push(Box::new(ConsoleSink::stdout()));
    }
    if let Some(path) = opts.csv_path() {
        match CSVSampleWriter::append(path) {
            Ok(csv) => sinks.push(Box::new(csv)),
            Err(e) => {
                eprintln!("error: could not open {}: {}", path.display(), e);
                process::exit(1);
            },
        }
    }
    if sinks.is_empty() {
        tracing::warn!("main: no sample output selected; samples are only counted");
    }

    let queue = match QueuedSink::spawn(sinks, QueuedSink::DEFAULT_CAPACITY) {
        Ok(queue) => queue,
        Err(e) => {
            eprintln!("error: could not start sample writer: {}", e);
            process::exit(1);
        },
    };
    let mut sink = SampleLimit::new(queue, opts.sample_limit(), cancel.clone());

    let (summary, tally) = if opts.demo() {
        let bus = SimulatedBus::new(opts.edge_interval());
        acquire(config, bus, &mut sink, &cancel)
    } else {
        match RpiBus::open(&config) {
            Ok(bus) => acquire(config, bus, &mut sink, &cancel),
            Err(e) => {
                eprintln!("error: could not open hardware: {}", e);
                process::exit(1);
            },
        }
    };

    let dropped = sink.into_inner().close();

    println!("Results:");
    println!("  samples: {}", summary.samples);
    println!("  failed cycles: {}", summary.failures);
    for (kind, count) in &tally {
        println!("    {}: {}", kind, count);
    }
    if dropped > 0 {
        println!("  dropped by writer: {}", dropped);
    }

    if let Some(fault) = summary.fault {
        eprintln!("error: acquisition stopped: {}", fault);
        process::exit(1);
    }
}

/// Run the acquisition loop until cancelled, counting failures by kind.
fn acquire<B, S>(config: AcquisitionConfig,
                 bus: B,
                 sink: &mut S,
                 cancel: &Cancellation) -> (RunSummary, BTreeMap<&'static str, u64>)
where
    B: BusInterface,
    S: SampleSink,
{
    let mut tally = BTreeMap::new();
    let mut sequencer = Sequencer::new(config, bus, SystemClock);
    let summary = sequencer.run(sink, cancel, |failure| {
        *tally.entry(failure.kind()).or_insert(0) += 1;
    });
    sequencer.release();

    (summary, tally)
}
