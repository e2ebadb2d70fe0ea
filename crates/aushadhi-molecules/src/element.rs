//! Periodic table data needed for parsing, valence and descriptors.

/// (symbol, average atomic mass) indexed by atomic number. Index 0 is the
/// SMILES wildcard `*`.
const ELEMENTS: [(&str, f64); 119] = [
    ("*", 0.0),
    ("H", 1.008), ("He", 4.0026),
    ("Li", 6.94), ("Be", 9.0122), ("B", 10.81), ("C", 12.011), ("N", 14.007),
    ("O", 15.999), ("F", 18.998), ("Ne", 20.180),
    ("Na", 22.990), ("Mg", 24.305), ("Al", 26.982), ("Si", 28.085), ("P", 30.974),
    ("S", 32.06), ("Cl", 35.45), ("Ar", 39.948),
    ("K", 39.098), ("Ca", 40.078), ("Sc", 44.956), ("Ti", 47.867), ("V", 50.942),
    ("Cr", 51.996), ("Mn", 54.938), ("Fe", 55.845), ("Co", 58.933), ("Ni", 58.693),
    ("Cu", 63.546), ("Zn", 65.38), ("Ga", 69.723), ("Ge", 72.630), ("As", 74.922),
    ("Se", 78.971), ("Br", 79.904), ("Kr", 83.798),
    ("Rb", 85.468), ("Sr", 87.62), ("Y", 88.906), ("Zr", 91.224), ("Nb", 92.906),
    ("Mo", 95.95), ("Tc", 98.0), ("Ru", 101.07), ("Rh", 102.91), ("Pd", 106.42),
    ("Ag", 107.87), ("Cd", 112.41), ("In", 114.82), ("Sn", 118.71), ("Sb", 121.76),
    ("Te", 127.60), ("I", 126.90), ("Xe", 131.29),
    ("Cs", 132.91), ("Ba", 137.33), ("La", 138.91), ("Ce", 140.12), ("Pr", 140.91),
    ("Nd", 144.24), ("Pm", 145.0), ("Sm", 150.36), ("Eu", 151.96), ("Gd", 157.25),
    ("Tb", 158.93), ("Dy", 162.50), ("Ho", 164.93), ("Er", 167.26), ("Tm", 168.93),
    ("Yb", 173.05), ("Lu", 174.97), ("Hf", 178.49), ("Ta", 180.95), ("W", 183.84),
    ("Re", 186.21), ("Os", 190.23), ("Ir", 192.22), ("Pt", 195.08), ("Au", 196.97),
    ("Hg", 200.59), ("Tl", 204.38), ("Pb", 207.2), ("Bi", 208.98), ("Po", 209.0),
    ("At", 210.0), ("Rn", 222.0),
    ("Fr", 223.0), ("Ra", 226.0), ("Ac", 227.0), ("Th", 232.04), ("Pa", 231.04),
    ("U", 238.03), ("Np", 237.0), ("Pu", 244.0), ("Am", 243.0), ("Cm", 247.0),
    ("Bk", 247.0), ("Cf", 251.0), ("Es", 252.0), ("Fm", 257.0), ("Md", 258.0),
    ("No", 259.0), ("Lr", 266.0), ("Rf", 267.0), ("Db", 268.0), ("Sg", 269.0),
    ("Bh", 270.0), ("Hs", 277.0), ("Mt", 278.0), ("Ds", 281.0), ("Rg", 282.0),
    ("Cn", 285.0), ("Nh", 286.0), ("Fl", 289.0), ("Mc", 290.0), ("Lv", 293.0),
    ("Ts", 294.0), ("Og", 294.0),
];

pub const HYDROGEN: u8 = 1;
pub const CARBON: u8 = 6;
pub const NITROGEN: u8 = 7;
pub const OXYGEN: u8 = 8;

/// Atomic number for an element symbol (case-sensitive, `*` is 0).
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ELEMENTS
        .iter()
        .position(|(s, _)| *s == symbol)
        .map(|z| z as u8)
}

pub fn symbol(atomic_number: u8) -> &'static str {
    ELEMENTS
        .get(atomic_number as usize)
        .map(|(s, _)| *s)
        .unwrap_or("*")
}

pub fn average_mass(atomic_number: u8) -> f64 {
    ELEMENTS
        .get(atomic_number as usize)
        .map(|(_, m)| *m)
        .unwrap_or(0.0)
}

/// Default valences for the SMILES organic subset, lowest first.
pub fn default_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        9 | 17 | 35 | 53 => &[1],
        _ => &[],
    }
}

/// CPK-style display colour.
pub fn cpk_color(atomic_number: u8) -> (u8, u8, u8) {
    match atomic_number {
        1 => (200, 200, 200),
        6 => (40, 40, 40),
        7 => (48, 80, 248),
        8 => (255, 13, 13),
        9 | 17 => (31, 200, 31),
        15 => (255, 128, 0),
        16 => (220, 190, 40),
        35 => (166, 41, 41),
        53 => (148, 0, 148),
        5 => (255, 150, 150),
        0 => (120, 120, 120),
        _ => (221, 119, 255),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_roundtrip_for_common_elements() {
        for sym in ["C", "N", "O", "Cl", "Br", "Se", "Og"] {
            let z = atomic_number(sym).unwrap();
            assert_eq!(symbol(z), sym);
        }
        assert_eq!(atomic_number("C"), Some(CARBON));
        assert_eq!(atomic_number("*"), Some(0));
        assert_eq!(atomic_number("Xx"), None);
        assert_eq!(atomic_number("cl"), None);
    }

    #[test]
    fn test_organic_subset_valences() {
        assert_eq!(default_valences(CARBON), &[4]);
        assert_eq!(default_valences(16), &[2, 4, 6]);
        assert!(default_valences(26).is_empty());
    }
}
