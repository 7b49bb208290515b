//! Reassembly sink.
//!
//! Single consumer of the results channel. Paints every [`TileResult`] onto
//! the canvas in arrival order and stops once the expected number of tiles
//! has been painted. Decoding is CPU work, so the sink runs on the blocking
//! pool rather than on a runtime worker thread.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::Canvas;
use crate::error::{StitchError, StitchResult};
use crate::fetch::ProgressCounters;
use crate::tile::TileResult;

/// Drains tile results into a [`Canvas`].
pub struct ReassemblySink {
    canvas: Canvas,
    expected: usize,
    rx: mpsc::UnboundedReceiver<TileResult>,
    progress: Arc<ProgressCounters>,
}

impl ReassemblySink {
    /// Creates a sink that will paint `expected` tiles onto `canvas`.
    pub fn new(
        canvas: Canvas,
        expected: usize,
        rx: mpsc::UnboundedReceiver<TileResult>,
        progress: Arc<ProgressCounters>,
    ) -> Self {
        Self {
            canvas,
            expected,
            rx,
            progress,
        }
    }

    /// Paints results until `expected` tiles are on the canvas.
    ///
    /// Blocks the calling thread. Fails with [`StitchError::Incomplete`] if
    /// every sender is dropped first, or with [`StitchError::Decode`] on the
    /// first tile that cannot be decoded.
    pub fn run(mut self) -> StitchResult<Canvas> {
        let mut painted = 0usize;

        while painted < self.expected {
            let Some(result) = self.rx.blocking_recv() else {
                debug!(painted, expected = self.expected, "Results channel closed early");
                return Err(StitchError::Incomplete {
                    painted,
                    expected: self.expected,
                });
            };

            self.canvas.paint(&result)?;
            painted += 1;
            self.progress.record_painted();
        }

        debug!(painted, "All tiles painted");
        Ok(self.canvas)
    }

    /// Runs the sink on the blocking thread pool.
    pub fn spawn(self) -> JoinHandle<StitchResult<Canvas>> {
        tokio::task::spawn_blocking(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{partition, TileDescriptor};
    use image::{Rgb, RgbImage};
    use rand::seq::SliceRandom;

    fn source_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 251) as u8, (y % 241) as u8, ((x * 7 + y * 3) % 256) as u8])
        })
    }

    fn encode_region(source: &RgbImage, tile: &TileDescriptor) -> Vec<u8> {
        let region =
            image::imageops::crop_imm(source, tile.x(), tile.y(), tile.width(), tile.height())
                .to_image();
        let mut buffer = Vec::new();
        region
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn progress(total: usize) -> Arc<ProgressCounters> {
        Arc::new(ProgressCounters::new(total, 100))
    }

    #[test]
    fn test_permuted_tiles_reproduce_source() {
        let source = source_image(300, 200);
        let mut tiles = partition(300, 200, 128).unwrap();
        tiles.shuffle(&mut rand::rng());

        let (tx, rx) = mpsc::unbounded_channel();
        for tile in &tiles {
            tx.send(TileResult::new(*tile, encode_region(&source, tile)))
                .unwrap();
        }

        let counters = progress(tiles.len());
        let sink = ReassemblySink::new(Canvas::new(300, 200), tiles.len(), rx, counters.clone());
        let canvas = sink.run().unwrap();

        assert_eq!(canvas.into_image(), source);
        assert_eq!(counters.snapshot().painted, tiles.len());
    }

    #[test]
    fn test_sink_stops_at_expected_count_without_channel_close() {
        let source = source_image(64, 64);
        let tiles = partition(64, 64, 32).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        for tile in &tiles {
            tx.send(TileResult::new(*tile, encode_region(&source, tile)))
                .unwrap();
        }

        // tx is still alive; the sink must not wait for it to close
        let canvas = ReassemblySink::new(Canvas::new(64, 64), tiles.len(), rx, progress(4))
            .run()
            .unwrap();
        assert_eq!(canvas.as_image(), &source);
        drop(tx);
    }

    #[test]
    fn test_early_close_is_incomplete() {
        let source = source_image(64, 64);
        let tiles = partition(64, 64, 32).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(TileResult::new(tiles[0], encode_region(&source, &tiles[0])))
            .unwrap();
        drop(tx);

        let err = ReassemblySink::new(Canvas::new(64, 64), 4, rx, progress(4))
            .run()
            .unwrap_err();
        assert!(matches!(
            err,
            StitchError::Incomplete {
                painted: 1,
                expected: 4
            }
        ));
    }

    #[test]
    fn test_decode_failure_stops_sink() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(TileResult::new(
            TileDescriptor::new(0, 0, 32, 32),
            vec![0xde, 0xad],
        ))
        .unwrap();

        let err = ReassemblySink::new(Canvas::new(32, 32), 1, rx, progress(1))
            .run()
            .unwrap_err();
        assert!(matches!(err, StitchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_spawned_sink_receives_from_async_senders() {
        let source = source_image(96, 40);
        let tiles = partition(96, 40, 32).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        let handle =
            ReassemblySink::new(Canvas::new(96, 40), tiles.len(), rx, progress(tiles.len()))
                .spawn();

        for tile in tiles.iter().rev() {
            let tx = tx.clone();
            let bytes = encode_region(&source, tile);
            let tile = *tile;
            tokio::spawn(async move { tx.send(TileResult::new(tile, bytes)) });
        }
        drop(tx);

        let canvas = handle.await.unwrap().unwrap();
        assert_eq!(canvas.into_image(), source);
    }
}
