pub mod code;
pub mod contest;
pub mod net;
pub mod normalize;
pub mod roster;
pub mod session;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::contest::{Contest, ContestCatalog};
    use crate::session::{ConnectionId, Participant};

    /// Two small contests covering the surname and alias matching cases.
    pub fn test_catalog() -> ContestCatalog {
        let contest = |id: &str, teams: [&str; 2], starters: &[&str]| Contest {
            id: id.to_string(),
            teams: teams.map(str::to_string),
            starters: starters.iter().map(|s| s.to_string()).collect(),
        };
        let contests = vec![
            contest(
                "spain",
                ["Spain", "Netherlands"],
                &["Xavi", "Xabi Alonso", "Iniesta", "Puyol", "Sneijder", "Robben"],
            ),
            contest(
                "germany",
                ["Germany", "Argentina"],
                &["Ozil", "Muller", "Lahm", "Messi", "Higuain"],
            ),
        ];
        match ContestCatalog::new(contests) {
            Ok(catalog) => catalog,
            Err(e) => panic!("test catalog is invalid: {e}"),
        }
    }

    pub fn participant(connection: ConnectionId, name: &str) -> Participant {
        Participant {
            connection,
            name: name.to_string(),
        }
    }
}
