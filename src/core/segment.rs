//! CNAE 主要活動代碼 → 宏觀市場區隔。
//!
//! 代碼前兩位數字是 CNAE 的 section；未使用的 section
//! (4, 34, 40, 44, 48, 54, 57, 67, 76, 83, 89) 回傳空字串。

/// 依 CNAE 代碼歸入宏觀區隔標籤。代碼取不出兩位數字時回傳空字串
pub fn macro_segment(activity_code: &str) -> &'static str {
    let digits: Vec<u32> = activity_code.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 2 {
        return "";
    }

    let section = digits[0] * 10 + digits[1];

    match section {
        1..=3 => "Agropecuária",
        5..=9 => "Indústrias extrativas",
        10..=33 => "Indústrias de transformação",
        35 => "Eletricidade e gás",
        36..=39 => "Água, esgoto, resíduos",
        41..=43 => "Construção",
        45..=47 => "Comércio / Varejo",
        49..=53 => "Transporte e correio",
        55..=56 => "Alojamento e alimentação",
        58..=63 => "Informação e comunicação",
        64..=66 => "Finanças e seguros",
        68 => "Imobiliário",
        69..=75 => "Serviços profissionais",
        77..=82 => "Serviços administrativos",
        84 => "Administração pública",
        85 => "Educação",
        86..=88 => "Saúde e assistência social",
        90..=93 => "Artes, esporte e recreação",
        94..=96 => "Outros serviços",
        97..=98 => "Serviços domésticos",
        99 => "Organismos internacionais",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_codes_use_first_two_digits() {
        assert_eq!(macro_segment("4711-3/00"), "Comércio / Varejo");
        assert_eq!(macro_segment("47.11-3-01"), "Comércio / Varejo");
        assert_eq!(macro_segment("0100"), "Agropecuária");
        assert_eq!(macro_segment("6201-5/01"), "Informação e comunicação");
    }

    #[test]
    fn test_single_section_entries() {
        assert_eq!(macro_segment("3500"), "Eletricidade e gás");
        assert_eq!(macro_segment("6810"), "Imobiliário");
        assert_eq!(macro_segment("8411"), "Administração pública");
        assert_eq!(macro_segment("8550"), "Educação");
        assert_eq!(macro_segment("99"), "Organismos internacionais");
    }

    #[test]
    fn test_range_boundaries() {
        assert_eq!(macro_segment("10"), "Indústrias de transformação");
        assert_eq!(macro_segment("33"), "Indústrias de transformação");
        assert_eq!(macro_segment("45"), "Comércio / Varejo");
        assert_eq!(macro_segment("47"), "Comércio / Varejo");
        assert_eq!(macro_segment("97"), "Serviços domésticos");
        assert_eq!(macro_segment("98"), "Serviços domésticos");
    }

    #[test]
    fn test_unused_sections_have_no_segment() {
        for code in ["0400", "3400", "4000", "4400", "4800", "5400", "5700", "6700", "7600", "8300", "8900"] {
            assert_eq!(macro_segment(code), "", "section of {} should be unused", code);
        }
    }

    #[test]
    fn test_short_or_empty_codes() {
        assert_eq!(macro_segment(""), "");
        assert_eq!(macro_segment("7"), "");
        assert_eq!(macro_segment("x-y"), "");
    }
}
