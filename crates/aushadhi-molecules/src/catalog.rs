//! Static target/molecule catalog and identifier resolution.
//!
//! The built-in tables are loaded once per process and never mutated.
//! Resolution is total: unknown identifiers fall through to the default
//! record.

use std::sync::OnceLock;

/// Display name used for identifiers with no protein-name entry.
pub const UNKNOWN_PROTEIN_NAME: &str = "Target Protein";

#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeEntry {
    pub smiles: String,
    pub name: String,
    /// IC50 in µM.
    pub ic50: f64,
}

impl MoleculeEntry {
    pub fn new(smiles: &str, name: &str, ic50: f64) -> Self {
        Self {
            smiles: smiles.to_string(),
            name: name.to_string(),
            ic50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetRecord {
    /// Canonical upper-case identifier.
    pub id: String,
    pub name: String,
    pub molecules: Vec<MoleculeEntry>,
}

impl TargetRecord {
    pub fn new(id: &str, name: &str, molecules: Vec<MoleculeEntry>) -> Self {
        Self {
            id: id.to_uppercase(),
            name: name.to_string(),
            molecules,
        }
    }
}

/// A generated alternative compound with the target it was proposed for.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternateCandidate {
    pub smiles: String,
    pub name: String,
    pub ic50: f64,
    pub target_pid: String,
    pub target_name: String,
}

/// Disease -> protein association row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinAssociation {
    pub protein: String,
    pub protein_id: String,
    pub contribution: f64,
    pub pathway: String,
}

/// Result of resolving an identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub record: &'a TargetRecord,
    pub display_name: &'a str,
    /// False when the default record was used.
    pub matched: bool,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    targets: Vec<TargetRecord>,
    aliases: Vec<(String, String)>,
    protein_names: Vec<(String, String)>,
    default_target: TargetRecord,
    alternates: Vec<AlternateCandidate>,
    associations: Vec<ProteinAssociation>,
}

fn normalize(identifier: &str) -> String {
    identifier.trim().to_uppercase()
}

impl Catalog {
    pub fn new(targets: Vec<TargetRecord>, default_target: TargetRecord) -> Self {
        Self {
            targets,
            aliases: Vec::new(),
            protein_names: Vec::new(),
            default_target,
            alternates: Vec::new(),
            associations: Vec::new(),
        }
    }

    pub fn with_aliases<'s>(mut self, aliases: impl IntoIterator<Item = (&'s str, &'s str)>) -> Self {
        self.aliases
            .extend(aliases.into_iter().map(|(a, t)| (normalize(a), normalize(t))));
        self
    }

    pub fn with_protein_names<'s>(mut self, names: impl IntoIterator<Item = (&'s str, &'s str)>) -> Self {
        self.protein_names
            .extend(names.into_iter().map(|(id, name)| (normalize(id), name.to_string())));
        self
    }

    pub fn with_alternates(mut self, alternates: Vec<AlternateCandidate>) -> Self {
        self.alternates = alternates;
        self
    }

    pub fn with_associations(mut self, associations: Vec<ProteinAssociation>) -> Self {
        self.associations = associations;
        self
    }

    /// Process-wide built-in tables.
    pub fn builtin() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(builtin_catalog)
    }

    fn target(&self, id: &str) -> Option<&TargetRecord> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Resolve a free-form identifier: exact target, then alias, then default.
    pub fn resolve(&self, identifier: &str) -> Resolution<'_> {
        let key = normalize(identifier);

        let canonical = self.target(&key).or_else(|| {
            self.aliases
                .iter()
                .find(|(alias, _)| *alias == key)
                .and_then(|(_, target)| self.target(target))
        });

        match canonical {
            Some(record) => Resolution {
                record,
                display_name: &record.name,
                matched: true,
            },
            None => Resolution {
                record: &self.default_target,
                display_name: self
                    .protein_names
                    .iter()
                    .find(|(id, _)| *id == key)
                    .map(|(_, name)| name.as_str())
                    .unwrap_or(UNKNOWN_PROTEIN_NAME),
                matched: false,
            },
        }
    }

    /// First catalog entry with exactly this SMILES, in target order.
    pub fn find_by_smiles(&self, smiles: &str) -> Option<(&TargetRecord, &MoleculeEntry)> {
        let smiles = smiles.trim();
        self.targets.iter().find_map(|target| {
            target
                .molecules
                .iter()
                .find(|m| m.smiles == smiles)
                .map(|m| (target, m))
        })
    }

    pub fn alternates(&self) -> &[AlternateCandidate] {
        &self.alternates
    }

    pub fn associations(&self) -> &[ProteinAssociation] {
        &self.associations
    }

    pub fn targets(&self) -> &[TargetRecord] {
        &self.targets
    }
}

fn builtin_catalog() -> Catalog {
    let targets = vec![
        TargetRecord::new(
            "TP53",
            "Cellular tumor antigen p53",
            vec![
                MoleculeEntry::new("CC(=O)Oc1ccccc1C(=O)O", "Aspirin analog", 0.35),
                MoleculeEntry::new("CN1C=NC2=C1C(=O)N(C(=O)N2C)C", "Caffeine derivative", 0.48),
                MoleculeEntry::new("CC(C)Cc1ccc(cc1)C(C)C(=O)O", "Ibuprofen analog", 0.65),
                MoleculeEntry::new("Cc1ccc(cc1)C(C)C(=O)O", "Ketoprofen analog", 0.72),
                MoleculeEntry::new(
                    "COc1ccc2c(c1)c(CC(=O)O)c(C)n2C(=O)c3ccc(Cl)cc3",
                    "Indometacin derivative",
                    0.28,
                ),
            ],
        ),
        TargetRecord::new(
            "EGFR",
            "Epidermal growth factor receptor",
            vec![
                MoleculeEntry::new("Nc1ncnc2c1ccc1ccc(O)cc12", "Gefitinib analog", 0.022),
                MoleculeEntry::new(
                    "COc1cc2ncnc(Nc3ccc(F)c(Cl)c3)c2cc1OCCCN4CCOCC4",
                    "Erlotinib derivative",
                    0.015,
                ),
                MoleculeEntry::new(
                    "CN(C)C/C=C/C(=O)Nc1cc2c(Nc3ccc(F)c(Cl)c3)ncnc2cc1OC",
                    "Afatinib analog",
                    0.008,
                ),
                MoleculeEntry::new(
                    "C#Cc1cccc(Nc2ncnc3cc(OCCOC)c(OCCOC)cc23)c1",
                    "Osimertinib core",
                    0.012,
                ),
            ],
        ),
        TargetRecord::new(
            "VEGFR2",
            "Vascular endothelial growth factor receptor 2",
            vec![
                MoleculeEntry::new("Cc1ccc(cc1)C(=O)Nc2ccc(cc2)C#N", "Sorafenib core", 0.045),
                MoleculeEntry::new(
                    "COc1cc2c(Nc3ccc(Br)cc3F)ncnc2cc1OCC4CCN(C)CC4",
                    "Vandetanib analog",
                    0.032,
                ),
            ],
        ),
        TargetRecord::new(
            "HER2",
            "Receptor tyrosine-protein kinase erbB-2",
            vec![
                MoleculeEntry::new("Nc1cc2c(cc1OC)ncnc2Nc3cccc(c3)C#N", "Lapatinib core", 0.018),
                MoleculeEntry::new(
                    "CCOc1cc2ncnc(Nc3cccc(c3)C#N)c2cc1OCC4CCCCC4",
                    "Neratinib analog",
                    0.025,
                ),
            ],
        ),
        TargetRecord::new(
            "BRAF",
            "Serine/threonine-protein kinase B-raf",
            vec![
                MoleculeEntry::new(
                    "CCC(=O)Nc1ccc(cc1)C(=O)Nc2ccc(C)c(Nc3nccc(n3)c4cccnc4)c2",
                    "Vemurafenib core",
                    0.031,
                ),
                MoleculeEntry::new(
                    "Cc1cc(nc(n1)Nc2ccc(cc2)S(=O)(=O)NC)c3cccc(F)c3",
                    "Dabrafenib analog",
                    0.045,
                ),
            ],
        ),
    ];

    let default_target = TargetRecord::new(
        "DEFAULT",
        UNKNOWN_PROTEIN_NAME,
        vec![
            MoleculeEntry::new("CC(=O)Oc1ccccc1C(=O)O", "Compound A", 0.35),
            MoleculeEntry::new("CN1C=NC2=C1C(=O)N(C(=O)N2C)C", "Compound B", 0.48),
            MoleculeEntry::new("CC(C)Cc1ccc(cc1)C(C)C(=O)O", "Compound C", 0.65),
        ],
    );

    let alternate = |smiles: &str, name: &str, ic50: f64, pid: &str| AlternateCandidate {
        smiles: smiles.to_string(),
        name: name.to_string(),
        ic50,
        target_pid: pid.to_string(),
        target_name: "TP53".to_string(),
    };

    Catalog::new(targets, default_target)
        .with_aliases([
            ("1TUP", "TP53"),
            ("P04637", "TP53"),
            ("P00533", "EGFR"),
            ("KDR", "VEGFR2"),
            ("ERBB2", "HER2"),
        ])
        .with_protein_names([
            ("ABL1", "Tyrosine-protein kinase ABL1"),
            ("ACE", "Angiotensin-converting enzyme"),
            ("COX2", "Cyclooxygenase-2"),
        ])
        .with_alternates(vec![
            alternate("CC(=O)Oc1ccccc1C(=O)O", "Aspirin_Analog_1", 0.35, "1TUP"),
            alternate("CCO", "Compound_A", 0.45, "2ABC"),
            alternate("CC(=O)O", "Compound_B", 0.52, "3DEF"),
            alternate("c1ccccc1", "Benzene_Derivative", 0.78, "4GHI"),
        ])
        .with_associations(vec![ProteinAssociation {
            protein: "TP53 (Tumor Protein P53)".to_string(),
            protein_id: "1TUP".to_string(),
            contribution: 0.68,
            pathway: "p53 ras".to_string(),
        }])
}
