//! The original Porter (1980) suffix-stripping algorithm.
//!
//! Follows the reference implementation's step order, including its two
//! departures from the paper (`-bli` → `-ble` in place of `-abli` → `-able`,
//! and `-logi` → `-log`). Words of two letters or fewer, and words with any
//! character outside `a-z`, are returned unchanged.

/// Stems one lowercase word.
pub fn stem(word: &str) -> String {
    if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }

    let mut stemmer = Porter { b: word.as_bytes().to_vec(), j: 0 };
    stemmer.step1ab();
    if stemmer.b.len() > 1 {
        stemmer.step1c();
        stemmer.step2();
        stemmer.step3();
        stemmer.step4();
        stemmer.step5();
    }

    // Only ASCII letters ever enter the buffer
    String::from_utf8(stemmer.b).unwrap_or_else(|_| word.to_string())
}

struct Porter {
    b: Vec<u8>,
    // End of the stem left by the last successful `ends`; -1 for an empty stem
    j: isize,
}

impl Porter {
    fn k(&self) -> isize {
        self.b.len() as isize - 1
    }

    fn at(&self, i: isize) -> u8 {
        self.b[i as usize]
    }

    fn is_consonant(&self, i: isize) -> bool {
        match self.at(i) {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of VC sequences in `b[..=j]`.
    fn measure(&self) -> usize {
        let mut n = 0;
        let mut i = 0;
        loop {
            if i > self.j {
                return n;
            }
            if !self.is_consonant(i) {
                break;
            }
            i += 1;
        }
        i += 1;
        loop {
            loop {
                if i > self.j {
                    return n;
                }
                if self.is_consonant(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
            n += 1;
            loop {
                if i > self.j {
                    return n;
                }
                if !self.is_consonant(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..=self.j).any(|i| !self.is_consonant(i))
    }

    fn double_consonant(&self, i: isize) -> bool {
        i >= 1 && self.at(i) == self.at(i - 1) && self.is_consonant(i)
    }

    // consonant-vowel-consonant ending, the last not w, x or y
    fn cvc(&self, i: isize) -> bool {
        if i < 2 || !self.is_consonant(i) || self.is_consonant(i - 1) || !self.is_consonant(i - 2) {
            return false;
        }
        !matches!(self.at(i), b'w' | b'x' | b'y')
    }

    fn ends(&mut self, suffix: &str) -> bool {
        if !self.b.ends_with(suffix.as_bytes()) {
            return false;
        }
        self.j = self.k() - suffix.len() as isize;
        true
    }

    fn set_to(&mut self, replacement: &str) {
        self.b.truncate((self.j + 1) as usize);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    fn replace(&mut self, replacement: &str) {
        if self.measure() > 0 {
            self.set_to(replacement);
        }
    }

    fn truncate_by(&mut self, n: usize) {
        let len = self.b.len() - n;
        self.b.truncate(len);
    }

    // First matching suffix in `rules` decides, whether or not it is replaced
    fn apply_first(&mut self, rules: &[(&str, &str)]) {
        for (suffix, replacement) in rules {
            if self.ends(suffix) {
                self.replace(replacement);
                return;
            }
        }
    }

    /// Plurals, `-ed` and `-ing`.
    fn step1ab(&mut self) {
        let k = self.k();
        if self.at(k) == b's' {
            if self.ends("sses") {
                self.truncate_by(2);
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.at(k - 1) != b's' {
                self.truncate_by(1);
            }
        }

        if self.ends("eed") {
            if self.measure() > 0 {
                self.truncate_by(1);
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.b.truncate((self.j + 1) as usize);
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_consonant(self.k()) {
                if !matches!(self.at(self.k()), b'l' | b's' | b'z') {
                    self.truncate_by(1);
                }
            } else {
                self.j = self.k();
                if self.measure() == 1 && self.cvc(self.k()) {
                    self.set_to("e");
                }
            }
        }
    }

    /// Terminal `y` to `i` when the stem has a vowel.
    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let k = self.k() as usize;
            self.b[k] = b'i';
        }
    }

    /// Double suffixes to single ones.
    fn step2(&mut self) {
        let rules: &[(&str, &str)] = match self.at(self.k() - 1) {
            b'a' => &[("ational", "ate"), ("tional", "tion")],
            b'c' => &[("enci", "ence"), ("anci", "ance")],
            b'e' => &[("izer", "ize")],
            b'l' => &[("bli", "ble"), ("alli", "al"), ("entli", "ent"), ("eli", "e"), ("ousli", "ous")],
            b'o' => &[("ization", "ize"), ("ation", "ate"), ("ator", "ate")],
            b's' => &[("alism", "al"), ("iveness", "ive"), ("fulness", "ful"), ("ousness", "ous")],
            b't' => &[("aliti", "al"), ("iviti", "ive"), ("biliti", "ble")],
            b'g' => &[("logi", "log")],
            _ => return,
        };
        self.apply_first(rules);
    }

    /// `-ic-`, `-full`, `-ness` and similar.
    fn step3(&mut self) {
        let rules: &[(&str, &str)] = match self.at(self.k()) {
            b'e' => &[("icate", "ic"), ("ative", ""), ("alize", "al")],
            b'i' => &[("iciti", "ic")],
            b'l' => &[("ical", "ic"), ("ful", "")],
            b's' => &[("ness", "")],
            _ => return,
        };
        self.apply_first(rules);
    }

    /// Drops `-ant`, `-ence` and the rest when the measure exceeds 1.
    fn step4(&mut self) {
        let suffixes: &[&str] = match self.at(self.k() - 1) {
            b'a' => &["al"],
            b'c' => &["ance", "ence"],
            b'e' => &["er"],
            b'i' => &["ic"],
            b'l' => &["able", "ible"],
            b'n' => &["ant", "ement", "ment", "ent"],
            b'o' => {
                let ion = self.ends("ion") && self.j >= 0 && matches!(self.at(self.j), b's' | b't');
                if !ion && !self.ends("ou") {
                    return;
                }
                &[]
            }
            b's' => &["ism"],
            b't' => &["ate", "iti"],
            b'u' => &["ous"],
            b'v' => &["ive"],
            b'z' => &["ize"],
            _ => return,
        };
        if !suffixes.is_empty() && !suffixes.iter().any(|suffix| self.ends(suffix)) {
            return;
        }
        if self.measure() > 1 {
            self.b.truncate((self.j + 1) as usize);
        }
    }

    /// Final `-e` and `-ll`.
    fn step5(&mut self) {
        self.j = self.k();
        if self.at(self.k()) == b'e' {
            let m = self.measure();
            if m > 1 || (m == 1 && !self.cvc(self.k() - 1)) {
                self.truncate_by(1);
            }
        }
        if self.at(self.k()) == b'l' && self.double_consonant(self.k()) && self.measure() > 1 {
            self.truncate_by(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(pairs: &[(&str, &str)]) {
        for (word, expected) in pairs {
            assert_eq!(stem(word), *expected, "{}", word);
        }
    }

    #[test]
    fn step1_plurals_and_participles() {
        check(&[
            ("caresses", "caress"), ("ponies", "poni"), ("ties", "ti"), ("caress", "caress"),
            ("cats", "cat"), ("feed", "feed"), ("agreed", "agre"), ("plastered", "plaster"),
            ("bled", "bled"), ("motoring", "motor"), ("sing", "sing"), ("conflated", "conflat"),
            ("troubled", "troubl"), ("sized", "size"), ("hopping", "hop"), ("tanned", "tan"),
            ("falling", "fall"), ("hissing", "hiss"), ("fizzed", "fizz"), ("failing", "fail"),
            ("filing", "file"), ("happy", "happi"), ("sky", "sky"),
        ]);
    }

    #[test]
    fn later_steps() {
        check(&[
            ("relational", "relat"), ("conditional", "condit"), ("valenci", "valenc"),
            ("digitizer", "digit"), ("conformabli", "conform"), ("radicalli", "radic"),
            ("differentli", "differ"), ("vileli", "vile"), ("analogousli", "analog"),
            ("vietnamization", "vietnam"), ("predication", "predic"), ("operator", "oper"),
            ("feudalism", "feudal"), ("decisiveness", "decis"), ("hopefulness", "hope"),
            ("formaliti", "formal"), ("sensitiviti", "sensit"), ("sensibiliti", "sensibl"),
            ("triplicate", "triplic"), ("formative", "form"), ("electriciti", "electr"),
            ("goodness", "good"), ("revival", "reviv"), ("allowance", "allow"),
            ("adjustment", "adjust"), ("adoption", "adopt"), ("homologou", "homolog"),
            ("probate", "probat"), ("rate", "rate"), ("cease", "ceas"), ("controll", "control"),
            ("roll", "roll"),
        ]);
    }

    #[test]
    fn differs_from_porter2() {
        check(&[
            ("skies", "ski"), ("dying", "dy"), ("generously", "gener"), ("news", "new"),
            ("hopefully", "hopefulli"),
        ]);
    }

    #[test]
    fn short_and_non_ascii_words_are_kept() {
        check(&[("is", "is"), ("a", "a"), ("", ""), ("naïve", "naïve")]);
    }
}
