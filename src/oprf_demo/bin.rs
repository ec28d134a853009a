use crate::cli_utils::{create_channels, create_correlation_sr, DemoArgs};
use crate::oprf::{Receiver, Sender};
use crate::set_utils::create_aligned_inputs;
use anyhow::{bail, Context, Result};
use itertools::Itertools;
use scuttlebutt::AesRng;
use std::time::Instant;
use tracing::info;

const INPUT_LEN: usize = 16;

/// Runs the demo described by `args`.
///
/// The receiver evaluates random inputs, the sender tests an aligned candidate at every
/// position. Fails if the matching positions differ from the expected ones.
pub fn run(args: DemoArgs) -> Result<()> {
    let config = args.config();
    let DemoArgs {
        batch_size,
        max_future_evaluations,
        common_size,
        channel_type,
        port,
        correlation,
        verbose,
        ..
    } = args;

    let mut rng = AesRng::new();

    let (inputs, candidates, common) =
        create_aligned_inputs(batch_size, common_size, INPUT_LEN, &mut rng)
            .with_context(|| "Failed to create inputs.")?;

    info!(batch_size, common_size, "inputs prepared");

    let (mut receiver_channel, mut sender_channel) =
        create_channels(channel_type, port).with_context(|| "Failed to create channels.")?;
    let (sender_provider, receiver_provider) = create_correlation_sr(correlation, &mut rng);

    let handle = std::thread::spawn(move || -> Result<_> {
        let mut rng = AesRng::new();

        let start = Instant::now();
        let sender = Sender::setup(
            &mut sender_channel,
            &mut rng,
            config,
            batch_size,
            max_future_evaluations,
            sender_provider,
        )
        .with_context(|| "Failed to set up sender.")?;

        info!(elapsed = ?start.elapsed(), "sender prepared");

        let start = Instant::now();
        let output = sender
            .evaluate(&mut sender_channel, batch_size)
            .with_context(|| "Failed to run sender.")?;

        info!(elapsed = ?start.elapsed(), "sender finished");

        Ok(output)
    });

    let start = Instant::now();
    let receiver = Receiver::setup(
        &mut receiver_channel,
        &mut rng,
        config,
        batch_size,
        max_future_evaluations,
        receiver_provider,
    )
    .with_context(|| "Failed to set up receiver.")?;

    info!(
        elapsed = ?start.elapsed(),
        codeword_bits = receiver.codeword_bits(),
        "receiver prepared"
    );

    let start = Instant::now();
    let receiver_output = receiver
        .evaluate(&mut receiver_channel, &inputs, &mut rng)
        .with_context(|| "Failed to run receiver.")?;

    info!(elapsed = ?start.elapsed(), "receiver finished");

    let sender_output = match handle.join() {
        Ok(res) => res?,
        Err(e) => std::panic::resume_unwind(e),
    };

    let start = Instant::now();
    let matches = candidates
        .iter()
        .enumerate()
        .map(|(i, y)| {
            let v = sender_output.evaluate(i, y)?;
            Ok((i, receiver_output.get(i) == Some(v.as_slice())))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter_map(|(i, hit)| hit.then_some(i))
        .collect_vec();

    info!(elapsed = ?start.elapsed(), matches = matches.len(), "candidates tested");

    if verbose {
        println!("matching positions: {:?}", matches);
    }

    if matches != common {
        bail!(
            "matching positions differ: expected {} got {} @{}:{}",
            common.len(),
            matches.len(),
            file!(),
            line!()
        );
    }

    Ok(())
}
