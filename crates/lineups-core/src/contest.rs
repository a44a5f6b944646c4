use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::roster::RosterIndex;

/// One historical match whose two starting line-ups form the answer pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub id: String,
    pub teams: [String; 2],
    pub starters: Vec<String>,
}

/// Contest identity shown in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestSummary {
    pub id: String,
    pub teams: [String; 2],
}

impl From<&Contest> for ContestSummary {
    fn from(contest: &Contest) -> Self {
        Self {
            id: contest.id.clone(),
            teams: contest.teams.clone(),
        }
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Empty,
    DuplicateId(String),
    Io(String),
    Parse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "contest catalog is empty"),
            Self::DuplicateId(id) => write!(f, "duplicate contest id: {id}"),
            Self::Io(e) => write!(f, "failed to read catalog: {e}"),
            Self::Parse(e) => write!(f, "failed to parse catalog: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// On-disk catalog layout: a list of `[[contests]]` tables.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    contests: Vec<Contest>,
}

/// Ordered, immutable set of contests with one roster index per contest.
#[derive(Debug)]
pub struct ContestCatalog {
    contests: Vec<Contest>,
    indexes: HashMap<String, RosterIndex>,
}

impl ContestCatalog {
    pub fn new(contests: Vec<Contest>) -> Result<Self, CatalogError> {
        if contests.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(contests.len());
        for contest in &contests {
            if !seen.insert(contest.id.as_str()) {
                return Err(CatalogError::DuplicateId(contest.id.clone()));
            }
        }
        Ok(Self::indexed(contests))
    }

    /// The ten finals shipped with the game.
    pub fn builtin() -> Self {
        let contests = BUILTIN_CONTESTS
            .iter()
            .map(|(id, teams, starters)| Contest {
                id: id.to_string(),
                teams: [teams[0].to_string(), teams[1].to_string()],
                starters: starters.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self::indexed(contests)
    }

    fn indexed(contests: Vec<Contest>) -> Self {
        let indexes = contests
            .iter()
            .map(|c| (c.id.clone(), RosterIndex::build(c)))
            .collect();
        Self { contests, indexes }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(file.contests)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Io(e.to_string()))?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            contests = catalog.len(),
            "Loaded contest catalog"
        );
        Ok(catalog)
    }

    /// Contest selected for newly created sessions.
    pub fn default_contest(&self) -> &Contest {
        &self.contests[0]
    }

    pub fn get(&self, id: &str) -> Option<&Contest> {
        self.contests.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.indexes.contains_key(id)
    }

    pub fn index(&self, id: &str) -> Option<&RosterIndex> {
        self.indexes.get(id)
    }

    pub fn contests(&self) -> &[Contest] {
        &self.contests
    }

    pub fn summaries(&self) -> Vec<ContestSummary> {
        self.contests.iter().map(ContestSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.contests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }
}

impl Default for ContestCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

type ContestSeed = (&'static str, [&'static str; 2], &'static [&'static str]);

const BUILTIN_CONTESTS: &[ContestSeed] = &[
    (
        "wc1998",
        ["France", "Brazil"],
        &[
            "Barthez", "Thuram", "Desailly", "Leboeuf", "Lizarazu", "Deschamps", "Karembeu",
            "Petit", "Djorkaeff", "Zidane", "Guivarc'h", "Taffarel", "Cafu", "Aldair",
            "Junior Baiano", "Roberto Carlos", "Cesar Sampaio", "Dunga", "Leonardo", "Rivaldo",
            "Ronaldo", "Bebeto",
        ],
    ),
    (
        "wc2010",
        ["Netherlands", "Spain"],
        &[
            "Stekelenburg", "Van der Wiel", "Heitinga", "Mathijsen", "Van Bronckhorst",
            "Van Bommel", "De Jong", "Sneijder", "Robben", "Kuyt", "Van Persie", "Casillas",
            "Ramos", "Pique", "Puyol", "Capdevila", "Busquets", "Xabi Alonso", "Xavi", "Pedro",
            "Iniesta", "Villa",
        ],
    ),
    (
        "wc2014",
        ["Germany", "Argentina"],
        &[
            "Neuer", "Lahm", "Boateng", "Hummels", "Howedes", "Schweinsteiger", "Kroos",
            "Kramer", "Ozil", "Muller", "Klose", "Romero", "Zabaleta", "Garay", "Demichelis",
            "Rojo", "Biglia", "Mascherano", "Perez", "Lavezzi", "Messi", "Higuain",
        ],
    ),
    (
        "wc2018",
        ["France", "Croatia"],
        &[
            "Lloris", "Pavard", "Varane", "Umtiti", "Hernandez", "Kante", "Pogba", "Matuidi",
            "Griezmann", "Mbappe", "Giroud", "Subasic", "Vrsaljko", "Lovren", "Vida", "Strinic",
            "Brozovic", "Modric", "Rakitic", "Perisic", "Rebic", "Mandzukic",
        ],
    ),
    (
        "wc2022",
        ["Argentina", "France"],
        &[
            "Martinez", "Molina", "Romero", "Otamendi", "Tagliafico", "De Paul", "Fernandez",
            "Mac Allister", "Di Maria", "Messi", "Alvarez", "Lloris", "Kounde", "Varane",
            "Upamecano", "Hernandez", "Tchouameni", "Rabiot", "Griezmann", "Dembele", "Mbappe",
            "Giroud",
        ],
    ),
    (
        "euro2004",
        ["Portugal", "Greece"],
        &[
            "Ricardo", "Miguel", "Ricardo Carvalho", "Jorge Andrade", "Nuno Valente", "Costinha",
            "Maniche", "Deco", "Figo", "Pauleta", "Cristiano Ronaldo", "Nikopolidis",
            "Seitaridis", "Dellas", "Kapsis", "Fyssas", "Katsouranis", "Basinas", "Zagorakis",
            "Giannakopoulos", "Charisteas", "Vryzas",
        ],
    ),
    (
        "euro2021",
        ["Italy", "England"],
        &[
            "Donnarumma", "Di Lorenzo", "Bonucci", "Chiellini", "Emerson", "Jorginho",
            "Verratti", "Barella", "Chiesa", "Insigne", "Immobile", "Pickford", "Walker",
            "Stones", "Maguire", "Trippier", "Phillips", "Rice", "Shaw", "Mount", "Sterling",
            "Kane",
        ],
    ),
    (
        "ucl2012",
        ["Bayern", "Chelsea"],
        &[
            "Neuer", "Lahm", "Boateng", "Tymoshchuk", "Contento", "Schweinsteiger", "Kroos",
            "Robben", "Muller", "Ribery", "Gomez", "Cech", "Bosingwa", "Cahill", "David Luiz",
            "Ashley Cole", "Mikel", "Lampard", "Kalou", "Mata", "Bertrand", "Drogba",
        ],
    ),
    (
        "ucl2005",
        ["Milan", "Liverpool"],
        &[
            "Dida", "Cafu", "Nesta", "Stam", "Maldini", "Gattuso", "Pirlo", "Seedorf", "Kaka",
            "Shevchenko", "Crespo", "Dudek", "Finnan", "Carragher", "Hyypia", "Traore", "Riise",
            "Gerrard", "Alonso", "Garcia", "Kewell", "Baros",
        ],
    ),
    (
        "ucl2019lva",
        ["Liverpool", "Barcelona"],
        &[
            "Alisson", "Alexander-Arnold", "Matip", "Van Dijk", "Robertson", "Fabinho",
            "Henderson", "Milner", "Shaqiri", "Origi", "Mane", "Ter Stegen", "Sergi Roberto",
            "Pique", "Lenglet", "Jordi Alba", "Rakitic", "Busquets", "Vidal", "Messi", "Suarez",
            "Coutinho",
        ],
    ),
];
