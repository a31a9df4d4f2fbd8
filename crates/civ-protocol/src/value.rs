//! Per-command value codec
//!
//! Translates between the values people type (Hz, percent, mode names,
//! filter index) and the payload bytes each command carries on the wire.

use std::fmt;
use std::str::FromStr;

use crate::bcd::{bcd_be_to_u64, bcd_le_to_u64, u64_to_bcd_be, u64_to_bcd_le};
use crate::command::CivCommand;
use crate::error::{EncodeError, ParseError};

/// Number of bytes in a frequency payload (10 BCD digits)
pub const FREQUENCY_LEN: usize = 5;
/// Number of bytes in a power payload
pub const POWER_LEN: usize = 2;
/// Highest raw power level
pub const POWER_RAW_MAX: u64 = 255;
/// Highest filter index the radio accepts
pub const FILTER_INDEX_MAX: i64 = 31;
/// Payload sent by trigger commands
pub const TRIGGER_ACTIVATE: u8 = 0x02;

/// Operating modes in the radio's mode table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CivMode {
    /// Lower Sideband
    Lsb,
    /// Upper Sideband
    Usb,
    /// Amplitude Modulation
    Am,
    /// Continuous Wave
    Cw,
    /// RTTY
    Rtty,
    /// Frequency Modulation
    Fm,
    /// CW Reverse
    CwR,
    /// RTTY Reverse
    RttyR,
}

impl CivMode {
    /// Every mode in the table
    pub const ALL: [CivMode; 8] = [
        CivMode::Lsb,
        CivMode::Usb,
        CivMode::Am,
        CivMode::Cw,
        CivMode::Rtty,
        CivMode::Fm,
        CivMode::CwR,
        CivMode::RttyR,
    ];

    /// Mode byte on the wire
    pub fn code(&self) -> u8 {
        match self {
            CivMode::Lsb => 0x00,
            CivMode::Usb => 0x01,
            CivMode::Am => 0x02,
            CivMode::Cw => 0x03,
            CivMode::Rtty => 0x04,
            CivMode::Fm => 0x05,
            CivMode::CwR => 0x07,
            CivMode::RttyR => 0x08,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            CivMode::Lsb => "LSB",
            CivMode::Usb => "USB",
            CivMode::Am => "AM",
            CivMode::Cw => "CW",
            CivMode::Rtty => "RTTY",
            CivMode::Fm => "FM",
            CivMode::CwR => "CW-R",
            CivMode::RttyR => "RTYR",
        }
    }

    /// Look up a mode byte
    pub fn from_code(code: u8) -> Option<CivMode> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }

    /// Look up a label, ignoring case
    pub fn from_label(label: &str) -> Option<CivMode> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// A decoded mode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModeReading {
    Known(CivMode),
    Unknown(u8),
}

impl From<u8> for ModeReading {
    fn from(code: u8) -> Self {
        CivMode::from_code(code).map_or(ModeReading::Unknown(code), ModeReading::Known)
    }
}

impl fmt::Display for ModeReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeReading::Known(mode) => f.write_str(mode.label()),
            ModeReading::Unknown(code) => write!(f, "UNKNOWN({})", code),
        }
    }
}

/// User argument attached to a request, validated at the text boundary
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Argument {
    /// Decimal integer
    Number(i64),
    /// Anything that is not a decimal integer, e.g. a mode name
    Label(String),
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(n) => Argument::Number(n),
            Err(_) => Argument::Label(s.to_string()),
        }
    }
}

impl FromStr for Argument {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Argument::from(s))
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Number(n) => write!(f, "{}", n),
            Argument::Label(s) => f.write_str(s),
        }
    }
}

/// Value decoded from a response payload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodedValue {
    /// Frequency in Hz
    Hz(u64),
    /// Power level, 0-100
    Percent(u8),
    /// Filter width index (device units)
    Index(u64),
    /// Operating mode
    Mode(ModeReading),
    /// Small setting value (QSK: 0, 1 or 2)
    Level(u8),
    /// Bytes with no further interpretation
    Raw(Vec<u8>),
    /// Response carried no data bytes
    Empty,
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Hz(hz) => write!(f, "{}", hz),
            DecodedValue::Percent(p) => write!(f, "{}", p),
            DecodedValue::Index(i) => write!(f, "{}", i),
            DecodedValue::Mode(mode) => write!(f, "{}", mode),
            DecodedValue::Level(l) => write!(f, "{}", l),
            DecodedValue::Raw(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                f.write_str(&hex.join(" "))
            }
            DecodedValue::Empty => f.write_str("None"),
        }
    }
}

/// How the radio firmware packs the two power bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PowerEncoding {
    /// Four BCD digits, most significant pair first (`01 91` = 191)
    #[default]
    PackedBcd,
    /// Plain big-endian integer (`00 BF` = 191)
    BigEndian,
}

/// Encodes request arguments and decodes response payloads per command
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueCodec {
    power_encoding: PowerEncoding,
}

impl ValueCodec {
    /// Create a codec with packed-BCD power levels
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec for a given power encoding
    pub fn with_power_encoding(power_encoding: PowerEncoding) -> Self {
        Self { power_encoding }
    }

    /// Encode a request argument into payload bytes
    ///
    /// An absent argument yields an empty payload (a read), except for
    /// trigger commands which always carry the activate byte.
    pub fn encode(
        &self,
        command: CivCommand,
        argument: Option<&Argument>,
    ) -> Result<Vec<u8>, EncodeError> {
        if command.is_trigger() {
            return Ok(vec![TRIGGER_ACTIVATE]);
        }

        let Some(argument) = argument else {
            return Ok(Vec::new());
        };

        match command {
            CivCommand::Frequency => encode_frequency(number(command, argument)?),
            CivCommand::PowerOutput => Ok(encode_power(
                number(command, argument)?,
                self.power_encoding,
            )),
            CivCommand::FilterWidth => encode_filter_index(number(command, argument)?),
            CivCommand::Mode => encode_mode(argument),
            CivCommand::Qsk => Ok(vec![truncate_to_byte(number(command, argument)?)]),
            CivCommand::Tune => Ok(vec![TRIGGER_ACTIVATE]),
        }
    }

    /// Decode a response payload (command and subcommand already stripped)
    pub fn decode(&self, command: CivCommand, data: &[u8]) -> Result<DecodedValue, ParseError> {
        match command {
            CivCommand::Frequency => decode_frequency(data).map(DecodedValue::Hz),
            CivCommand::PowerOutput => {
                decode_power(data, self.power_encoding).map(DecodedValue::Percent)
            }
            CivCommand::FilterWidth if data.is_empty() => Ok(DecodedValue::Empty),
            CivCommand::FilterWidth => bcd_le_to_u64(data).map(DecodedValue::Index),
            CivCommand::Mode => Ok(data
                .first()
                .map_or(DecodedValue::Empty, |&code| DecodedValue::Mode(code.into()))),
            CivCommand::Qsk => Ok(data
                .first()
                .map_or(DecodedValue::Empty, |&level| DecodedValue::Level(level))),
            CivCommand::Tune => Ok(DecodedValue::Raw(data.to_vec())),
        }
    }
}

fn number(command: CivCommand, argument: &Argument) -> Result<i64, EncodeError> {
    match argument {
        Argument::Number(n) => Ok(*n),
        Argument::Label(input) => Err(EncodeError::NotNumeric {
            command: command.name(),
            input: input.clone(),
        }),
    }
}

fn truncate_to_byte(value: i64) -> u8 {
    (value & 0xFF) as u8
}

/// Frequency in Hz → 5 bytes little-endian BCD
///
/// Values wider than 10 digits keep their 10 least significant digits.
pub fn encode_frequency(hz: i64) -> Result<Vec<u8>, EncodeError> {
    let hz = u64::try_from(hz).map_err(|_| EncodeError::OutOfRange {
        command: CivCommand::Frequency.name(),
        value: hz,
    })?;
    Ok(u64_to_bcd_le(hz, FREQUENCY_LEN))
}

/// Little-endian BCD → frequency in Hz
pub fn decode_frequency(data: &[u8]) -> Result<u64, ParseError> {
    bcd_le_to_u64(data)
}

/// Power percentage → raw level, rounding ties to even
///
/// The percentage saturates at 0 and 100. Ties fall on 10, 30, 50, 70 and
/// 90 %; 30 % gives 76 and 70 % gives 178.
pub fn percent_to_raw(percent: i64) -> u64 {
    let scaled = percent.clamp(0, 100) as u64 * POWER_RAW_MAX;
    let (raw, rest) = (scaled / 100, scaled % 100);
    if rest > 50 || (rest == 50 && raw % 2 == 1) {
        raw + 1
    } else {
        raw
    }
}

/// Raw level → power percentage, rounding half up
///
/// Levels above the radio's maximum saturate at 100 %.
pub fn raw_to_percent(raw: u64) -> u8 {
    let raw = raw.min(POWER_RAW_MAX);
    ((raw * 100 + POWER_RAW_MAX / 2) / POWER_RAW_MAX) as u8
}

/// Power percentage → 2 payload bytes
pub fn encode_power(percent: i64, encoding: PowerEncoding) -> Vec<u8> {
    let raw = percent_to_raw(percent);
    match encoding {
        PowerEncoding::PackedBcd => u64_to_bcd_be(raw, POWER_LEN),
        PowerEncoding::BigEndian => (raw as u16).to_be_bytes().to_vec(),
    }
}

/// 2 payload bytes → power percentage
///
/// Anything other than exactly two bytes reads as 0 %.
pub fn decode_power(data: &[u8], encoding: PowerEncoding) -> Result<u8, ParseError> {
    let &[high, low] = data else {
        return Ok(0);
    };

    let raw = match encoding {
        PowerEncoding::PackedBcd => bcd_be_to_u64(&[high, low])?,
        PowerEncoding::BigEndian => u64::from(u16::from_be_bytes([high, low])),
    };

    Ok(raw_to_percent(raw))
}

/// Filter index (0-31) → one two-digit BCD byte
pub fn encode_filter_index(index: i64) -> Result<Vec<u8>, EncodeError> {
    if !(0..=FILTER_INDEX_MAX).contains(&index) {
        return Err(EncodeError::OutOfRange {
            command: CivCommand::FilterWidth.name(),
            value: index,
        });
    }

    let tens = (index / 10) as u8;
    let ones = (index % 10) as u8;
    Ok(vec![(tens << 4) | ones])
}

/// Mode label or raw mode number → one mode byte
pub fn encode_mode(argument: &Argument) -> Result<Vec<u8>, EncodeError> {
    match argument {
        Argument::Number(n) => Ok(vec![truncate_to_byte(*n)]),
        Argument::Label(label) => CivMode::from_label(label)
            .map(|mode| vec![mode.code()])
            .ok_or_else(|| EncodeError::UnknownMode(label.clone())),
    }
}

/// Mode payload → mode reading
pub fn decode_mode(data: &[u8]) -> Option<ModeReading> {
    data.first().map(|&code| code.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Argument {
        Argument::Label(s.to_string())
    }

    #[test]
    fn test_argument_parsing() {
        assert_eq!("14250000".parse::<Argument>().unwrap(), Argument::Number(14_250_000));
        assert_eq!("-3".parse::<Argument>().unwrap(), Argument::Number(-3));
        assert_eq!("cw-r".parse::<Argument>().unwrap(), label("cw-r"));
    }

    #[test]
    fn test_read_has_empty_payload() {
        let codec = ValueCodec::new();
        for cmd in CivCommand::ALL.into_iter().filter(|c| !c.is_trigger()) {
            assert!(codec.encode(cmd, None).unwrap().is_empty(), "{}", cmd);
        }
    }

    #[test]
    fn test_tune_always_activates() {
        let codec = ValueCodec::new();
        assert_eq!(codec.encode(CivCommand::Tune, None).unwrap(), vec![0x02]);
        assert_eq!(
            codec
                .encode(CivCommand::Tune, Some(&Argument::Number(0)))
                .unwrap(),
            vec![0x02]
        );
    }

    #[test]
    fn test_encode_frequency() {
        assert_eq!(
            encode_frequency(14_250_000).unwrap(),
            vec![0x00, 0x00, 0x25, 0x14, 0x00]
        );
        assert!(matches!(
            encode_frequency(-1),
            Err(EncodeError::OutOfRange { value: -1, .. })
        ));
    }

    #[test]
    fn test_decode_frequency_fixture() {
        // Reversed: 01 40 01 30 00 -> "0140013000"
        assert_eq!(
            decode_frequency(&[0x00, 0x30, 0x01, 0x40, 0x01]).unwrap(),
            140_013_000
        );
        assert_eq!(decode_frequency(&[]).unwrap(), 0);
    }

    #[test]
    fn test_encode_power_75_percent() {
        assert_eq!(encode_power(75, PowerEncoding::PackedBcd), vec![0x01, 0x91]);
        assert_eq!(encode_power(75, PowerEncoding::BigEndian), vec![0x00, 0xBF]);
    }

    #[test]
    fn test_power_ties_round_to_even() {
        assert_eq!(percent_to_raw(10), 26);
        assert_eq!(percent_to_raw(30), 76);
        assert_eq!(percent_to_raw(50), 128);
        assert_eq!(percent_to_raw(70), 178);
        assert_eq!(percent_to_raw(90), 230);
        assert_eq!(encode_power(30, PowerEncoding::PackedBcd), vec![0x00, 0x76]);
        assert_eq!(encode_power(70, PowerEncoding::PackedBcd), vec![0x01, 0x78]);
    }

    #[test]
    fn test_power_saturates() {
        assert_eq!(encode_power(150, PowerEncoding::PackedBcd), vec![0x02, 0x55]);
        assert_eq!(encode_power(-20, PowerEncoding::PackedBcd), vec![0x00, 0x00]);
        assert_eq!(decode_power(&[0x09, 0x99], PowerEncoding::PackedBcd).unwrap(), 100);
    }

    #[test]
    fn test_decode_power() {
        assert_eq!(decode_power(&[0x01, 0x91], PowerEncoding::PackedBcd).unwrap(), 75);
        assert_eq!(decode_power(&[0x00, 0xBF], PowerEncoding::BigEndian).unwrap(), 75);
        assert_eq!(decode_power(&[0x02, 0x55], PowerEncoding::PackedBcd).unwrap(), 100);
        assert_eq!(decode_power(&[0x01], PowerEncoding::PackedBcd).unwrap(), 0);
        assert_eq!(
            decode_power(&[0x00, 0xBF], PowerEncoding::PackedBcd),
            Err(ParseError::InvalidBcd(0xBF))
        );
    }

    #[test]
    fn test_filter_index() {
        assert_eq!(encode_filter_index(31).unwrap(), vec![0x31]);
        assert_eq!(encode_filter_index(7).unwrap(), vec![0x07]);
        assert!(encode_filter_index(32).is_err());
        assert!(encode_filter_index(-1).is_err());

        let codec = ValueCodec::new();
        assert_eq!(
            codec.decode(CivCommand::FilterWidth, &[0x31]).unwrap(),
            DecodedValue::Index(31)
        );
        assert_eq!(
            codec.decode(CivCommand::FilterWidth, &[]).unwrap(),
            DecodedValue::Empty
        );
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(encode_mode(&label("usb")).unwrap(), vec![0x01]);
        assert_eq!(encode_mode(&label("CW-R")).unwrap(), vec![0x07]);
        assert_eq!(encode_mode(&Argument::Number(8)).unwrap(), vec![0x08]);
        assert_eq!(encode_mode(&Argument::Number(0x105)).unwrap(), vec![0x05]);
        assert_eq!(
            encode_mode(&label("SSTV")),
            Err(EncodeError::UnknownMode("SSTV".into()))
        );
    }

    #[test]
    fn test_decode_mode() {
        assert_eq!(
            decode_mode(&encode_mode(&label("USB")).unwrap()).unwrap().to_string(),
            "USB"
        );
        assert_eq!(decode_mode(&[0x09]).unwrap().to_string(), "UNKNOWN(9)");
        assert_eq!(decode_mode(&[]), None);
    }

    #[test]
    fn test_qsk() {
        let codec = ValueCodec::new();
        assert_eq!(
            codec
                .encode(CivCommand::Qsk, Some(&Argument::Number(2)))
                .unwrap(),
            vec![0x02]
        );
        assert_eq!(
            codec.decode(CivCommand::Qsk, &[0x01]).unwrap(),
            DecodedValue::Level(1)
        );
        assert_eq!(codec.decode(CivCommand::Qsk, &[]).unwrap(), DecodedValue::Empty);
    }

    #[test]
    fn test_label_for_numeric_command() {
        let codec = ValueCodec::new();
        let err = codec
            .encode(CivCommand::PowerOutput, Some(&label("HIGH")))
            .unwrap_err();
        assert_eq!(
            err,
            EncodeError::NotNumeric {
                command: "POWER_OUTPUT",
                input: "HIGH".into()
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DecodedValue::Hz(14_250_000).to_string(), "14250000");
        assert_eq!(DecodedValue::Raw(vec![0xFB, 0x02]).to_string(), "FB 02");
        assert_eq!(DecodedValue::Empty.to_string(), "None");
        assert_eq!(
            DecodedValue::Mode(ModeReading::Known(CivMode::RttyR)).to_string(),
            "RTYR"
        );
    }
}
