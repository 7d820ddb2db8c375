//! File parsers: the bank statement export and the dual-table budget ledger.

pub mod dual_ledger;
pub mod sg_statement;

/// Lowercase and drop French accents so headers compare loosely.
pub(crate) fn fold(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'à' | 'â' => 'a',
            'î' | 'ï' => 'i',
            'ô' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::fold;

    #[test]
    fn test_fold() {
        assert_eq!(fold(" Catégorie "), "categorie");
        assert_eq!(fold("Détail de l'écriture"), "detail de l'ecriture");
        assert_eq!(fold("LIBELLÉ"), "libelle");
    }
}
