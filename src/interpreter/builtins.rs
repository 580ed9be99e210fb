use crate::interpreter::value::Value;

/// Built-in zero-argument identifiers, consulted when a name is not in
/// the environment. A user assignment to the same name shadows the
/// builtin until the workspace is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    BellaCiao,
    Professor,
    RandomCodename,
    VaultCode,
    PoliceResponseTime,
    HostageCount,
    SecurityGuards,
    MoneyPrinterStatus,
    EscapeRoute,
    HackerStatus,
    PoliceNegotiator,
    TimeRemaining,
}

impl Builtin {
    pub const ALL: [Builtin; 12] = [
        Self::BellaCiao,
        Self::Professor,
        Self::RandomCodename,
        Self::VaultCode,
        Self::PoliceResponseTime,
        Self::HostageCount,
        Self::SecurityGuards,
        Self::MoneyPrinterStatus,
        Self::EscapeRoute,
        Self::HackerStatus,
        Self::PoliceNegotiator,
        Self::TimeRemaining,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BellaCiao => "bella_ciao",
            Self::Professor => "professor",
            Self::RandomCodename => "random_codename",
            Self::VaultCode => "vault_code",
            Self::PoliceResponseTime => "police_response_time",
            Self::HostageCount => "hostage_count",
            Self::SecurityGuards => "security_guards",
            Self::MoneyPrinterStatus => "money_printer_status",
            Self::EscapeRoute => "escape_route",
            Self::HackerStatus => "hacker_status",
            Self::PoliceNegotiator => "police_negotiator",
            Self::TimeRemaining => "time_remaining",
        }
    }

    /// One-line description shown by the shell's `help` command.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BellaCiao => "Print the heist anthem",
            Self::Professor => "Get info about the heist mastermind",
            Self::RandomCodename => "Get a random city codename",
            Self::VaultCode => "Generate a random vault code",
            Self::PoliceResponseTime => "Get estimated police response time",
            Self::HostageCount => "Get a random number of hostages",
            Self::SecurityGuards => "Get a random number of security guards",
            Self::MoneyPrinterStatus => "Check the status of the money printer",
            Self::EscapeRoute => "Get a random escape route",
            Self::HackerStatus => "Check the status of the hacking operation",
            Self::PoliceNegotiator => "Get the name of the police negotiator",
            Self::TimeRemaining => "Get the remaining time for the heist",
        }
    }

    pub fn call(&self) -> Value {
        match self {
            Self::BellaCiao => {
                Value::Str("Bella ciao, bella ciao, bella ciao, ciao, ciao!".to_string())
            }
            Self::Professor => {
                Value::Str("The Professor - mastermind of the heist".to_string())
            }
            Self::RandomCodename => Value::Str(
                pick(&[
                    "Tokyo",
                    "Berlin",
                    "Nairobi",
                    "Rio",
                    "Denver",
                    "Moscow",
                    "Helsinki",
                    "Oslo",
                    "Lisbon",
                    "Stockholm",
                    "Palermo",
                    "Marseille",
                ])
                .to_string(),
            ),
            Self::VaultCode => Value::Int(pick_range(1000, 9999)),
            Self::PoliceResponseTime => Value::Int(pick_range(3, 30)),
            Self::HostageCount => Value::Int(pick_range(8, 67)),
            Self::SecurityGuards => Value::Int(pick_range(2, 15)),
            Self::MoneyPrinterStatus => Value::Str(
                pick(&[
                    "printing at full capacity",
                    "running low on paper",
                    "jammed - send Nairobi",
                    "cooling down",
                    "offline for maintenance",
                ])
                .to_string(),
            ),
            Self::EscapeRoute => Value::Str(
                pick(&[
                    "through the tunnel",
                    "across the rooftop",
                    "down the service elevator",
                    "out with the hostages",
                    "via the vault's back wall",
                ])
                .to_string(),
            ),
            Self::HackerStatus => Value::Str(
                pick(&[
                    "Rio is inside the police servers",
                    "cameras looped",
                    "firewall holding",
                    "signal jammers active",
                    "tracing the negotiator's call",
                ])
                .to_string(),
            ),
            Self::PoliceNegotiator => Value::Str("Inspector Raquel Murillo".to_string()),
            Self::TimeRemaining => Value::Int(pick_range(1, 105)),
        }
    }
}

pub fn lookup(name: &str) -> Option<Builtin> {
    Builtin::ALL.iter().copied().find(|b| b.name() == name)
}

/// Clock-derived entropy, fresh on every call.
fn entropy() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    u64::from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock should be after unix epoch")
            .subsec_nanos(),
    )
}

fn pick<'a>(choices: &[&'a str]) -> &'a str {
    choices[entropy() as usize % choices.len()]
}

fn pick_range(low: i64, high: i64) -> i64 {
    low + (entropy() % (high - low + 1) as u64) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_every_builtin() {
        for builtin in Builtin::ALL {
            assert_eq!(lookup(builtin.name()), Some(builtin));
        }
    }

    #[test]
    fn lookup_rejects_unknown_name() {
        assert_eq!(lookup("helicopter"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn descriptions_are_present() {
        for builtin in Builtin::ALL {
            assert!(!builtin.description().is_empty());
        }
    }

    #[test]
    fn fixed_builtins_are_deterministic() {
        assert_eq!(
            Builtin::PoliceNegotiator.call(),
            Value::Str("Inspector Raquel Murillo".to_string())
        );
        assert_eq!(Builtin::BellaCiao.call(), Builtin::BellaCiao.call());
        assert_eq!(Builtin::Professor.call(), Builtin::Professor.call());
    }

    #[test]
    fn vault_code_is_four_digits() {
        for _ in 0..32 {
            match Builtin::VaultCode.call() {
                Value::Int(code) => assert!((1000..=9999).contains(&code)),
                other => panic!("vault_code should be an int, got {other:?}"),
            }
        }
    }

    #[test]
    fn counts_are_ints_in_range() {
        let cases: [(Builtin, i64, i64); 4] = [
            (Builtin::PoliceResponseTime, 3, 30),
            (Builtin::HostageCount, 8, 67),
            (Builtin::SecurityGuards, 2, 15),
            (Builtin::TimeRemaining, 1, 105),
        ];
        for (builtin, low, high) in cases {
            match builtin.call() {
                Value::Int(n) => assert!(
                    (low..=high).contains(&n),
                    "{} produced {n}, outside {low}..={high}",
                    builtin.name()
                ),
                other => panic!("{} should be an int, got {other:?}", builtin.name()),
            }
        }
    }

    #[test]
    fn statuses_are_nonempty_strings() {
        let statuses = [
            Builtin::RandomCodename,
            Builtin::MoneyPrinterStatus,
            Builtin::EscapeRoute,
            Builtin::HackerStatus,
        ];
        for builtin in statuses {
            match builtin.call() {
                Value::Str(s) => assert!(!s.is_empty()),
                other => panic!("{} should be a string, got {other:?}", builtin.name()),
            }
        }
    }

    #[test]
    fn pick_range_covers_bounds() {
        for _ in 0..64 {
            let n = pick_range(1, 3);
            assert!((1..=3).contains(&n));
        }
        assert_eq!(pick_range(7, 7), 7);
    }
}
