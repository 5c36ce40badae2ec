//! Amino acid ambiguity lookups
//!
//! Residues are one letter codes. Ambiguity codes stand for a group of residues:
//! B = D/N, J = I/L, Z = E/Q and X = any residue.

/// Every one letter code a seed tag may be built from, ambiguity codes last
pub const AMINO_ACIDS: [char; 26] = [
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'Y',
    'U', 'O', 'V', 'W', 'B', 'J', 'Z', 'X',
];

/// Residues that are not ambiguity codes
pub const UNIQUE_AMINO_ACIDS: [char; 22] = [
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'Y',
    'U', 'O', 'V', 'W',
];

pub fn is_amino_acid(residue: char) -> bool {
    AMINO_ACIDS.contains(&residue)
}

pub fn is_combination(residue: char) -> bool {
    matches!(residue, 'B' | 'J' | 'Z' | 'X')
}

/// Residues an ambiguity code stands for, including nested codes for X.
pub fn sub_amino_acids(residue: char) -> &'static [char] {
    const X_SUB: [char; 25] = [
        'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'Y',
        'U', 'O', 'V', 'W', 'B', 'J', 'Z',
    ];
    match residue {
        'B' => &['D', 'N'],
        'J' => &['I', 'L'],
        'Z' => &['E', 'Q'],
        'X' => &X_SUB,
        _ => &[],
    }
}

/// Ambiguity codes that may stand for this residue.
pub fn combinations(residue: char) -> &'static [char] {
    match residue {
        'D' | 'N' => &['B', 'X'],
        'I' | 'L' => &['J', 'X'],
        'E' | 'Q' => &['Z', 'X'],
        'X' => &[],
        _ => &['X'],
    }
}

/// Monoisotopic residue mass in Da. Ambiguity codes B, J and Z carry the mean of their
/// residues; X has no defined mass.
pub fn monoisotopic_mass(residue: char) -> Option<f64> {
    let mass = match residue {
        'A' => 71.03711,
        'C' => 103.00919,
        'D' => 115.02694,
        'E' => 129.04259,
        'F' => 147.06841,
        'G' => 57.02146,
        'H' => 137.05891,
        'I' => 113.08406,
        'K' => 128.09496,
        'L' => 113.08406,
        'M' => 131.04049,
        'N' => 114.04293,
        'P' => 97.05276,
        'Q' => 128.05858,
        'R' => 156.10111,
        'S' => 87.03203,
        'T' => 101.04768,
        'Y' => 163.06333,
        'U' => 150.95364,
        'O' => 237.14773,
        'V' => 99.06841,
        'W' => 186.07931,
        'B' => 114.534935,
        'J' => 113.08406,
        'Z' => 128.550585,
        _ => return None,
    };
    Some(mass)
}

/// Residues whose mass differs from this residue's by less than `tolerance`.
///
/// Contains the residue itself when it has a mass. A non-finite tolerance yields nothing.
pub fn indistinguishable_amino_acids(residue: char, tolerance: f64) -> Vec<char> {
    let Some(mass) = monoisotopic_mass(residue) else {
        return Vec::new();
    };
    if !tolerance.is_finite() {
        return Vec::new();
    }
    AMINO_ACIDS
        .iter()
        .copied()
        .filter(|&other| {
            monoisotopic_mass(other).is_some_and(|other_mass| (mass - other_mass).abs() < tolerance)
        })
        .collect()
}
