use std::fmt;
use std::str::FromStr;

use crate::domain::errors::ParameterError;

/// Where the OHLCV history for a prediction comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputMode {
    /// The backend fetches the history itself; only ticker/window/horizon are sent.
    #[default]
    RemoteFetch,
    /// History is fetched here from a market-data provider and sent along.
    LocalFetch,
    /// History comes from a user-supplied CSV file.
    Upload,
}

impl InputMode {
    pub const ALL: [InputMode; 3] = [
        InputMode::RemoteFetch,
        InputMode::LocalFetch,
        InputMode::Upload,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InputMode::RemoteFetch => "Ticker (API fetches)",
            InputMode::LocalFetch => "Ticker (app fetches)",
            InputMode::Upload => "Upload CSV",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            InputMode::RemoteFetch => {
                "The backend collects the history. Only window and horizon are sent."
            }
            InputMode::LocalFetch => {
                "History is downloaded here and the last `window` rows are sent to the API."
            }
            InputMode::Upload => {
                "Upload a CSV with Open, High, Low, Close, Volume and an optional Date column."
            }
        }
    }

    pub fn needs_ticker(self) -> bool {
        !matches!(self, InputMode::Upload)
    }
}

impl FromStr for InputMode {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "remote-fetch" | "api" => Ok(InputMode::RemoteFetch),
            "local" | "local-fetch" | "app" => Ok(InputMode::LocalFetch),
            "upload" | "csv" => Ok(InputMode::Upload),
            _ => Err(ParameterError::InvalidInputMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputMode::RemoteFetch => "remote",
            InputMode::LocalFetch => "local",
            InputMode::Upload => "upload",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for mode in InputMode::ALL {
            assert_eq!(mode.to_string().parse::<InputMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_parse_aliases_and_case() {
        assert_eq!("CSV".parse::<InputMode>().unwrap(), InputMode::Upload);
        assert_eq!("Api".parse::<InputMode>().unwrap(), InputMode::RemoteFetch);
        assert!("ftp".parse::<InputMode>().is_err());
    }
}
