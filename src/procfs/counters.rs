//! Double-buffered reading of accumulative counters
//!
//! A [`CounterReader`] keeps, for each tracked entity (a block device, a network interface, or the
//! whole machine for CPU time), the two last snapshots of its counters. Each read overwrites the
//! oldest snapshot of every entity, then flips a reader-wide index so that the snapshot just read
//! becomes the previous one for the next read. Past the construction of the reader, reading and
//! computing rates allocates nothing.

use std::marker::PhantomData;
#[cfg(not(test))]
use std::time::Instant;

use log::debug;
#[cfg(test)]
use sn_fake_clock::FakeClock as Instant;

use crate::procfs::parsers::{Lines, TokenParser};
use crate::procfs::rates::interval_secs;
use crate::procfs::reader::ReadPseudoFile;
use crate::procfs::ProcfsError;

/// Describes how the counters of one category are laid out in their pseudo-file
pub trait CounterLayout {
    /// The counters of a single entity, as read from one line of the file
    type Raw: Copy + Default;

    /// Splits a line into the key identifying an entity, and the content holding its counters
    ///
    /// Returns `None` for lines which do not hold counters (blank lines, headers...)
    fn split_key(line: &[u8]) -> Result<Option<(&[u8], &[u8])>, ProcfsError>;

    /// Decodes the counters following the key of a line
    fn decode(tokens: &mut TokenParser) -> Result<Self::Raw, ProcfsError>;

    /// Checks the overall shape of the content of the file, before any line is parsed
    ///
    /// This is only called on the initial read of a reader.
    fn check_format(_content: &[u8]) -> Result<(), ProcfsError> {
        Ok(())
    }
}

/// Per-second rates of a single entity, computed from two snapshots of its counters
pub trait RateRecord {
    type Raw;

    /// The name of the entity these rates are computed for
    fn entity(&self) -> &str;

    fn fill(&mut self, curr: &Self::Raw, prev: &Self::Raw, interval_secs: f64);
}

/// The two last snapshots of the counters of an entity
struct DualBufferCell<R> {
    name: String,
    snapshots: [R; 2],
}

impl<R> DualBufferCell<R>
where
    R: Copy + Default,
{
    fn new(name: &str) -> Self {
        DualBufferCell {
            name: name.to_string(),
            snapshots: [R::default(); 2],
        }
    }
}

/// Reads the counters of a set of entities, and keeps their two last snapshots
///
/// A `CounterReader` is not meant to be shared: all reads take `&mut self`.
pub struct CounterReader<L>
where
    L: CounterLayout,
{
    source: Box<dyn ReadPseudoFile + Send>,
    cells: Vec<DualBufferCell<L::Raw>>,
    curr: usize,
    prev_time: Instant,
    layout: PhantomData<L>,
}

impl<L> CounterReader<L>
where
    L: CounterLayout,
{
    /// Creates a reader tracking the given entities, and performs an initial read
    ///
    /// The initial read only stores snapshots: rates can only be computed from the next read on.
    ///
    /// # Arguments
    ///  * `source`: The pseudo-file from which to read counters
    ///  * `entities`: The names of the entities to track. Lines of the file for other entities are
    ///    ignored.
    pub fn new(source: Box<dyn ReadPseudoFile + Send>, entities: &[&str]) -> Result<Self, ProcfsError> {
        let mut cells = Vec::with_capacity(entities.len());

        for (idx, name) in entities.iter().enumerate() {
            if entities[..idx].contains(name) {
                return Err(ProcfsError::DuplicateEntity(name.to_string()));
            }

            cells.push(DualBufferCell::new(name));
        }

        let mut reader = CounterReader {
            source,
            cells,
            curr: 0,
            prev_time: Instant::now(),
            layout: PhantomData,
        };

        reader.prime()?;

        Ok(reader)
    }

    /// Returns the names of the tracked entities, in the order they were given at construction
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|cell| cell.name.as_str())
    }

    fn prime(&mut self) -> Result<(), ProcfsError> {
        let content = self.source.read()?;
        L::check_format(content)?;
        Self::parse(content, &mut self.cells, self.curr)?;

        debug!("Primed counter reader for {} entities", self.cells.len());

        self.commit(Instant::now());
        Ok(())
    }

    /// Reads new snapshots, then lets `fill` compute rates from them
    ///
    /// If reading or `fill` fails, the reader state is left as if this call never happened: the
    /// next read computes rates against the same previous snapshots.
    pub fn read_with<F>(&mut self, fill: F) -> Result<(), ProcfsError>
    where
        F: FnOnce(&Snapshots<L::Raw>) -> Result<(), ProcfsError>,
    {
        let content = self.source.read()?;
        Self::parse(content, &mut self.cells, self.curr)?;

        let now = Instant::now();
        let snapshots = Snapshots {
            cells: &self.cells,
            curr: self.curr,
            interval_secs: interval_secs(now - self.prev_time),
        };

        fill(&snapshots)?;

        self.commit(now);
        Ok(())
    }

    /// Reads new snapshots, and fills each record with the rates of the entity it names
    ///
    /// Fails with [`ProcfsError::EntityNotFound`] if a record names an entity which is not tracked.
    pub fn read_records<O>(&mut self, records: &mut [O]) -> Result<(), ProcfsError>
    where
        O: RateRecord<Raw = L::Raw>,
    {
        self.read_with(|snapshots| {
            for record in records.iter_mut() {
                let (curr, prev) = snapshots.get(record.entity())?;
                record.fill(curr, prev, snapshots.interval_secs());
            }

            Ok(())
        })
    }

    fn parse(content: &[u8], cells: &mut [DualBufferCell<L::Raw>], curr: usize) -> Result<(), ProcfsError> {
        for line in Lines::new(content) {
            let (key, counters) = match L::split_key(line)? {
                Some(split) => split,
                None => continue,
            };

            if let Some(cell) = cells.iter_mut().find(|cell| cell.name.as_bytes() == key) {
                cell.snapshots[curr] = L::decode(&mut TokenParser::new(counters))?;
            }
        }

        Ok(())
    }

    fn commit(&mut self, now: Instant) {
        self.prev_time = now;
        self.curr = 1 - self.curr;
    }

    /// Returns the snapshot stored by the last successful read for the given entity
    #[cfg(test)]
    pub(crate) fn latest(&self, name: &str) -> Option<&L::Raw> {
        self.cells
            .iter()
            .find(|cell| cell.name == name)
            .map(|cell| &cell.snapshots[1 - self.curr])
    }
}

/// A view over the current and previous snapshots of all entities of a reader
pub struct Snapshots<'a, R> {
    cells: &'a [DualBufferCell<R>],
    curr: usize,
    interval_secs: f64,
}

impl<'a, R> Snapshots<'a, R> {
    /// Returns the current and previous snapshots of the given entity
    pub fn get(&self, name: &str) -> Result<(&'a R, &'a R), ProcfsError> {
        self.cells
            .iter()
            .find(|cell| cell.name == name)
            .map(|cell| (&cell.snapshots[self.curr], &cell.snapshots[1 - self.curr]))
            .ok_or_else(|| ProcfsError::EntityNotFound(name.to_string()))
    }

    /// The amount of seconds elapsed between the previous and the current snapshots
    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }
}
