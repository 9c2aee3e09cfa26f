use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Días de la semana en el orden que usa el back-office (domingo primero).
pub const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Hora local de reloj (`HH:mm`), sin zona horaria.
///
/// El orden de `ClockTime` coincide con el orden lexicográfico de su forma
/// `HH:mm` rellenada con ceros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    minutes: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid time; HH:mm format is expected")]
pub struct TimeParseError(pub String);

impl ClockTime {
    pub fn new(hours: u32, minutes: u32) -> Option<Self> {
        if hours < 24 && minutes < 60 {
            Some(Self {
                minutes: (hours * 60 + minutes) as u16,
            })
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            minutes: minutes.rem_euclid(MINUTES_PER_DAY) as u16,
        }
    }

    pub fn hours(&self) -> u32 {
        self.minutes as u32 / 60
    }

    pub fn minute(&self) -> u32 {
        self.minutes as u32 % 60
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.minutes as u32
    }

    /// Suma minutos dando la vuelta a las 24h.
    pub fn add_minutes(self, minutes: i64) -> Self {
        Self::from_minutes(self.minutes as i64 + minutes.rem_euclid(MINUTES_PER_DAY))
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        Self {
            minutes: (time.hour() * 60 + time.minute()) as u16,
        }
    }
}

impl FromStr for ClockTime {
    type Err = TimeParseError;

    /// Acepta `H:mm`, `HH:mm` y `HH:mm:ss` (columnas TIME de SQL).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimeParseError(s.to_owned());
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(err());
        }
        if parts[1].len() != 2 {
            return Err(err());
        }
        let hours: u32 = parts[0].parse().map_err(|_| err())?;
        let minutes: u32 = parts[1].parse().map_err(|_| err())?;
        if let Some(seconds) = parts.get(2) {
            let seconds: u32 = seconds.parse().map_err(|_| err())?;
            if seconds >= 60 {
                return Err(err());
            }
        }
        ClockTime::new(hours, minutes).ok_or_else(err)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Aplica un retraso en minutos. Sin retraso (`None` o 0) devuelve la hora tal cual.
pub fn add_delay(time: ClockTime, delay_minutes: Option<i64>) -> ClockTime {
    match delay_minutes {
        Some(delay) if delay != 0 => time.add_minutes(delay),
        _ => time,
    }
}

pub fn to_minutes_since_midnight(time: ClockTime) -> u32 {
    time.minutes_since_midnight()
}

/// Minutos entre `reference` y `target` dentro del mismo día (negativo si ya pasó).
pub fn minutes_until(target: ClockTime, reference: ClockTime) -> i64 {
    target.minutes_since_midnight() as i64 - reference.minutes_since_midnight() as i64
}

/// Día siguiente en el ciclo domingo-primero; `None` si el nombre no se reconoce.
pub fn next_weekday(day: &str) -> Option<&'static str> {
    let index = WEEKDAYS.iter().position(|d| *d == day)?;
    Some(WEEKDAYS[(index + 1) % WEEKDAYS.len()])
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAYS[weekday.num_days_from_sunday() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(t("08:05").to_string(), "08:05");
        assert_eq!(t("8:05").to_string(), "08:05");
        assert_eq!(t("23:59:00").to_string(), "23:59");
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("12:5".parse::<ClockTime>().is_err());
        assert!("".parse::<ClockTime>().is_err());
        assert!("noon".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_add_delay_wraps_midnight() {
        assert_eq!(add_delay(t("23:59"), Some(1)), t("00:00"));
        assert_eq!(add_delay(t("23:50"), Some(25)), t("00:15"));
        assert_eq!(add_delay(t("10:00"), Some(90)), t("11:30"));
    }

    #[test]
    fn test_add_delay_extreme_values() {
        // i64::MAX % 1440 = 1087 (18:07)
        assert_eq!(add_delay(t("08:00"), Some(i64::MAX)), t("02:07"));
        assert_eq!(add_delay(t("08:00"), Some(i64::MIN)), t("13:52"));
    }

    #[test]
    fn test_add_delay_without_delay() {
        assert_eq!(add_delay(t("10:00"), None), t("10:00"));
        assert_eq!(add_delay(t("10:00"), Some(0)), t("10:00"));
    }

    #[test]
    fn test_add_delay_is_monotonic_within_day() {
        let base = t("06:00");
        let mut previous = base;
        for delay in 0..600 {
            let shifted = add_delay(base, Some(delay));
            assert!(shifted >= previous);
            previous = shifted;
        }
    }

    #[test]
    fn test_ordering_matches_string_order() {
        let mut times = vec![t("10:00"), t("09:59"), t("00:01"), t("23:00")];
        let mut strings: Vec<String> = times.iter().map(|t| t.to_string()).collect();
        times.sort();
        strings.sort();
        let sorted: Vec<String> = times.iter().map(|t| t.to_string()).collect();
        assert_eq!(sorted, strings);
    }

    #[test]
    fn test_next_weekday() {
        assert_eq!(next_weekday("Sunday"), Some("Monday"));
        assert_eq!(next_weekday("Saturday"), Some("Sunday"));
        assert_eq!(next_weekday("Lundi"), None);
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
        assert_eq!(weekday_name(Weekday::Wed), "Wednesday");
    }

    #[test]
    fn test_minutes_until() {
        assert_eq!(minutes_until(t("08:26"), t("08:00")), 26);
        assert_eq!(minutes_until(t("07:59"), t("08:00")), -1);
        assert_eq!(to_minutes_since_midnight(t("01:30")), 90);
    }
}
