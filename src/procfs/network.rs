//! Network interfaces traffic, from `/proc/net/dev`

use crate::procfs::counters::{CounterLayout, CounterReader, RateRecord};
use crate::procfs::parsers::{next_field, Lines, TokenParser};
use crate::procfs::rates::per_sec;
use crate::procfs::reader::{PseudoFileReader, ReadPseudoFile, COUNTERS_BUFFER_SIZE};
use crate::procfs::ProcfsError;

const NET_DEV_PATH: &str = "/proc/net/dev";

/// Columns of the receive section of `/proc/net/dev`, in order
const RECEIVE_COLUMNS: [&str; 8] = [
    "bytes",
    "packets",
    "errs",
    "drop",
    "fifo",
    "frame",
    "compressed",
    "multicast",
];
/// Leading columns of the transmit section of `/proc/net/dev`, in order
const TRANSMIT_COLUMNS: [&str; 6] = ["bytes", "packets", "errs", "drop", "fifo", "colls"];
/// Receive columns between the receive drops and the transmit bytes (fifo, frame, compressed, multicast)
const RECEIVE_UNUSED_FIELDS: usize = 4;
/// Transmit columns between the transmit drops and the collisions (fifo)
const TRANSMIT_UNUSED_FIELDS: usize = 1;

/// Traffic rates of a network interface
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NetworkStat {
    pub dev_name: String,
    pub recv_bytes_per_sec: f64,
    pub recv_packets_per_sec: f64,
    pub recv_errs_per_sec: f64,
    pub recv_drops_per_sec: f64,
    pub trans_bytes_per_sec: f64,
    pub trans_packets_per_sec: f64,
    pub trans_errs_per_sec: f64,
    pub trans_drops_per_sec: f64,
    pub trans_colls_per_sec: f64,
}

impl NetworkStat {
    /// Creates a record to be filled with the rates of the given interface
    pub fn new(dev_name: &str) -> Self {
        NetworkStat {
            dev_name: dev_name.to_string(),
            ..Default::default()
        }
    }
}

/// Traffic counters of a network interface
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawNetworkStat {
    pub recv_bytes: u64,
    pub recv_packets: u64,
    pub recv_errs: u64,
    pub recv_drops: u64,
    pub trans_bytes: u64,
    pub trans_packets: u64,
    pub trans_errs: u64,
    pub trans_drops: u64,
    pub trans_colls: u64,
}

pub struct NetworkLayout;

impl CounterLayout for NetworkLayout {
    type Raw = RawNetworkStat;

    fn split_key(line: &[u8]) -> Result<Option<(&[u8], &[u8])>, ProcfsError> {
        let (start, end) = match next_field(line) {
            Some(field) => field,
            None => return Ok(None),
        };

        // The kernel pads interface names to a fixed width, so wide counters may be glued to the
        // colon (e.g. `eth0:123456`)
        let split = line[start..end]
            .iter()
            .position(|&b| b == b':')
            .map(|colon| (&line[start..start + colon], &line[start + colon + 1..]));

        Ok(split)
    }

    fn decode(tokens: &mut TokenParser) -> Result<Self::Raw, ProcfsError> {
        let recv_bytes = tokens.next_u64()?;
        let recv_packets = tokens.next_u64()?;
        let recv_errs = tokens.next_u64()?;
        let recv_drops = tokens.next_u64()?;
        tokens.skip(RECEIVE_UNUSED_FIELDS)?;

        let trans_bytes = tokens.next_u64()?;
        let trans_packets = tokens.next_u64()?;
        let trans_errs = tokens.next_u64()?;
        let trans_drops = tokens.next_u64()?;
        tokens.skip(TRANSMIT_UNUSED_FIELDS)?;

        Ok(RawNetworkStat {
            recv_bytes,
            recv_packets,
            recv_errs,
            recv_drops,
            trans_bytes,
            trans_packets,
            trans_errs,
            trans_drops,
            trans_colls: tokens.next_u64()?,
        })
    }

    /// Checks that the column header matches the field positions used by [`Self::decode()`]
    ///
    /// Content without a column header is accepted as is.
    fn check_format(content: &[u8]) -> Result<(), ProcfsError> {
        for line in Lines::new(content) {
            let mut sections = line.split(|&b| b == b'|').skip(1);

            let (receive, transmit) = match (sections.next(), sections.next()) {
                (Some(receive), Some(transmit)) => (receive, transmit),
                _ => continue,
            };

            if !starts_with_columns(receive, &RECEIVE_COLUMNS[..1]) {
                // Not the column header (e.g. the `Inter-| Receive | Transmit` line)
                continue;
            }

            let receive_ok = starts_with_columns(receive, &RECEIVE_COLUMNS)
                && TokenParser::new(receive).skip(RECEIVE_COLUMNS.len() + 1).is_err();

            if !receive_ok || !starts_with_columns(transmit, &TRANSMIT_COLUMNS) {
                let err_msg = format!("Unsupported columns header: {}", String::from_utf8_lossy(line).trim());
                return Err(ProcfsError::InvalidFileFormat(err_msg));
            }

            return Ok(());
        }

        Ok(())
    }
}

/// Indicates whether the first tokens of `section` are the given column names
fn starts_with_columns(section: &[u8], columns: &[&str]) -> bool {
    let mut tokens = TokenParser::new(section);

    columns
        .iter()
        .all(|column| tokens.next_token().map_or(false, |token| token == column.as_bytes()))
}

/// Reads the traffic rates of a set of network interfaces
pub struct NetworkStatReader {
    counters: CounterReader<NetworkLayout>,
}

impl NetworkStatReader {
    /// Creates a reader of `/proc/net/dev` tracking the given interfaces, and performs an initial read
    ///
    /// Fails with [`ProcfsError::InvalidFileFormat`] if the columns of the file are not laid out as
    /// expected.
    pub fn new(dev_names: &[&str]) -> Result<Self, ProcfsError> {
        let source = PseudoFileReader::new(NET_DEV_PATH, COUNTERS_BUFFER_SIZE);
        Self::from_source(Box::new(source), dev_names)
    }

    pub fn from_source(source: Box<dyn ReadPseudoFile + Send>, dev_names: &[&str]) -> Result<Self, ProcfsError> {
        Ok(NetworkStatReader {
            counters: CounterReader::new(source, dev_names)?,
        })
    }

    /// Returns the names of the tracked interfaces
    pub fn dev_names(&self) -> impl Iterator<Item = &str> {
        self.counters.entities()
    }

    /// Fills each record with the rates of the interface it names, since the previous read
    pub fn read(&mut self, stats: &mut [NetworkStat]) -> Result<(), ProcfsError> {
        self.counters.read_records(stats)
    }
}

impl RateRecord for NetworkStat {
    type Raw = RawNetworkStat;

    fn entity(&self) -> &str {
        &self.dev_name
    }

    fn fill(&mut self, curr: &RawNetworkStat, prev: &RawNetworkStat, interval_secs: f64) {
        self.recv_bytes_per_sec = per_sec(prev.recv_bytes, curr.recv_bytes, interval_secs);
        self.recv_packets_per_sec = per_sec(prev.recv_packets, curr.recv_packets, interval_secs);
        self.recv_errs_per_sec = per_sec(prev.recv_errs, curr.recv_errs, interval_secs);
        self.recv_drops_per_sec = per_sec(prev.recv_drops, curr.recv_drops, interval_secs);
        self.trans_bytes_per_sec = per_sec(prev.trans_bytes, curr.trans_bytes, interval_secs);
        self.trans_packets_per_sec = per_sec(prev.trans_packets, curr.trans_packets, interval_secs);
        self.trans_errs_per_sec = per_sec(prev.trans_errs, curr.trans_errs, interval_secs);
        self.trans_drops_per_sec = per_sec(prev.trans_drops, curr.trans_drops, interval_secs);
        self.trans_colls_per_sec = per_sec(prev.trans_colls, curr.trans_colls, interval_secs);
    }
}

#[cfg(test)]
mod test_network_layout {
    use crate::procfs::network::{NetworkStatReader, RawNetworkStat};
    use crate::procfs::reader::fakes::FakePseudoFile;
    use crate::procfs::ProcfsError;

    const HEADER: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

    const NET_DEV_CONTENT: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
veth72350E: 8630270  113545    0    0    0     0          0         0 251802663  733421    0    0    0     0       0          0
    lo: 17899045627 119002139    0    0    0     0          0         0 17899045627 119002139    0    0    0     0       0          0
   br0: 329426402871 130478210    2    1    0     0          0         0 27152202131 88015716    3    4    5     0       0          0
enp0s25: 344775743869 253048085    0  139    0     0          0   3121901 29493822351 102872359    0    0    0     0       0          0
virbr0-nic:       0       0    0    0    0     0          0         0        0       0    0    0    0     0       0          0
";

    fn build_reader(content: &str, dev_names: &[&str]) -> Result<NetworkStatReader, ProcfsError> {
        NetworkStatReader::from_source(Box::new(FakePseudoFile::from_content(content)), dev_names)
    }

    #[test]
    fn test_parse_net_dev_file() {
        let reader = build_reader(NET_DEV_CONTENT, &["br0", "enp0s25"]).unwrap();

        assert_eq!(
            reader.counters.latest("br0"),
            Some(&RawNetworkStat {
                recv_bytes: 329426402871,
                recv_packets: 130478210,
                recv_errs: 2,
                recv_drops: 1,
                trans_bytes: 27152202131,
                trans_packets: 88015716,
                trans_errs: 3,
                trans_drops: 4,
                trans_colls: 0,
            })
        );
        assert_eq!(
            reader.counters.latest("enp0s25").map(|stat| stat.recv_drops),
            Some(139)
        );
    }

    #[test]
    fn test_transmit_counters_should_skip_unused_receive_columns() {
        let content = format!(
            "{}  eth0: 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16\n",
            HEADER
        );

        let reader = build_reader(&content, &["eth0"]).unwrap();

        assert_eq!(
            reader.counters.latest("eth0"),
            Some(&RawNetworkStat {
                recv_bytes: 1,
                recv_packets: 2,
                recv_errs: 3,
                recv_drops: 4,
                trans_bytes: 9,
                trans_packets: 10,
                trans_errs: 11,
                trans_drops: 12,
                trans_colls: 14,
            })
        );
    }

    #[test]
    fn test_should_parse_counters_glued_to_interface_name() {
        let content = "eth0:1234567890123 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16\n";

        let reader = build_reader(content, &["eth0"]).unwrap();

        assert_eq!(reader.counters.latest("eth0").map(|stat| stat.recv_bytes), Some(1234567890123));
    }

    #[test]
    fn test_should_not_match_interface_name_prefix() {
        let reader = build_reader(NET_DEV_CONTENT, &["virbr0"]).unwrap();

        assert_eq!(reader.counters.latest("virbr0"), Some(&RawNetworkStat::default()));
    }

    #[test]
    fn test_should_reject_unexpected_receive_columns() {
        let content = " face |bytes    packets errs drop fifo frame compressed multicast extra|bytes    packets errs drop fifo colls carrier compressed\n";

        let result = build_reader(content, &["eth0"]);

        assert!(matches!(result, Err(ProcfsError::InvalidFileFormat(_))));
    }

    #[test]
    fn test_should_reject_unexpected_transmit_columns() {
        let content = " face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop colls carrier compressed\n";

        let result = build_reader(content, &["eth0"]);

        assert!(matches!(result, Err(ProcfsError::InvalidFileFormat(_))));
    }

    #[test]
    fn test_should_accept_content_without_header() {
        let content = "eth0: 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16\n";

        assert!(build_reader(content, &["eth0"]).is_ok());
    }

    #[test]
    fn test_should_fail_on_truncated_line() {
        let content = format!("{}  eth0: 1 2 3 4 5 6 7 8 9\n", HEADER);

        let result = build_reader(&content, &["eth0"]);

        assert!(matches!(result, Err(ProcfsError::InvalidFileFormat(_))));
    }
}
