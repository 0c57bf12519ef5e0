//! Serialization of host-to-device traffic, and of events as the board sends them

use crate::img::Grid;
use crate::{Event, GRID_SIDE, SKIPPED_ADDRESS};
use anyhow::Result;
use std::io::Write;

/// Linear neuron address of a grid cell, row-major
#[inline]
pub fn address(row: usize, col: usize) -> u8 {
    (row * GRID_SIDE + col) as u8
}

/// `(address, intensity)` pairs for an image load, in row-major order.
///
/// The last cell is never included: its address equals the stop sentinel.
pub fn pairs(grid: &Grid) -> impl Iterator<Item = (u8, u8)> + '_ {
    grid.iter().enumerate().flat_map(|(row, cells)| {
        cells
            .iter()
            .enumerate()
            .map(move |(col, &v)| (address(row, col), v))
    })
    .filter(|&(addr, _)| addr != SKIPPED_ADDRESS)
}

/// Flatten an image load to the bytes that go over the wire
pub fn grid(grid: &Grid) -> Vec<u8> {
    pairs(grid).flat_map(|(a, v)| [a, v]).collect()
}

/// Write an image load one pair at a time. Nothing is acknowledged by the board.
pub fn write_grid(wtr: &mut impl Write, grid: &Grid) -> Result<usize> {
    let mut n = 0;
    for (addr, value) in pairs(grid) {
        wtr.write_all(&[addr])?;
        wtr.write_all(&[value])?;
        n += 1;
    }
    wtr.flush()?;
    Ok(n)
}

/// Write a single sentinel byte, e.g. [`crate::START_STREAMING`]
pub fn write_command(wtr: &mut impl Write, cmd: u8) -> Result<()> {
    wtr.write_all(&[cmd])?;
    wtr.flush()?;
    Ok(())
}

/// Serialize events the way the board streams them. Useful for replaying
/// captures and for driving the decoder without hardware.
pub fn events(events: &[Event]) -> Vec<u8> {
    let mut b = Vec::with_capacity(events.len() * crate::EVENT_SIZE);
    for e in events {
        b.extend_from_slice(&e.time.to_be_bytes());
        b.push(e.address);
    }
    b
}
