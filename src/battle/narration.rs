//! Narrated battle lines with placeholder substitution
//!
//! Templates use `{key}` for plain substitution and `{key:조사}` to append the
//! grammatical particle that fits the substituted word, e.g. `{name:이}`
//! renders as "관우가" or "조운이". The particle choice is
//! delegated to a `ParticlePicker` so other languages can plug in their own.

use std::sync::Arc;

use crate::battle::constants::*;

/// Picks the surface form of a particle for the word it follows
pub trait ParticlePicker: Send + Sync {
    /// `particle` is either form of a pair ("이" or "가"); unknown particles
    /// are returned unchanged
    fn pick(&self, word: &str, particle: &str) -> String;
}

/// Final-consonant class of a word's last syllable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalSound {
    Vowel,
    Rieul,
    Consonant,
    Unknown,
}

const HANGUL_BASE: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;
const JONG_COUNT: u32 = 28;
const JONG_RIEUL: u32 = 8;

// (with final consonant, without)
const PARTICLE_PAIRS: [(&str, &str); 5] = [("이", "가"), ("은", "는"), ("을", "를"), ("과", "와"), ("으로", "로")];

/// Korean particles chosen by final-consonant test
#[derive(Debug, Clone, Copy, Default)]
pub struct KoreanParticles;

impl KoreanParticles {
    pub fn final_sound(word: &str) -> FinalSound {
        let Some(last) = word.trim_end().chars().last() else {
            return FinalSound::Unknown;
        };
        if last.is_ascii_digit() {
            return Self::number_final_sound(word.trim_end());
        }
        let code = u32::from(last);
        if !(HANGUL_BASE..=HANGUL_LAST).contains(&code) {
            return FinalSound::Unknown;
        }
        match (code - HANGUL_BASE) % JONG_COUNT {
            0 => FinalSound::Vowel,
            JONG_RIEUL => FinalSound::Rieul,
            _ => FinalSound::Consonant,
        }
    }

    /// Final sound of a number read in Sino-Korean (일, 이, 삼 … 십, 백, 천, 만)
    fn number_final_sound(word: &str) -> FinalSound {
        let digits: Vec<u8> = word
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_digit())
            .collect();
        let Some(nonzero) = digits.iter().position(|b| *b != b'0') else {
            // 영
            return FinalSound::Consonant;
        };
        match nonzero {
            0 => match digits[0] {
                b'1' | b'7' | b'8' => FinalSound::Rieul, // 일, 칠, 팔
                b'3' | b'6' => FinalSound::Consonant,    // 삼, 육
                _ => FinalSound::Vowel,                  // 이, 사, 오, 구
            },
            // 십, 백, 천, 만, 억, 조
            _ => FinalSound::Consonant,
        }
    }
}

impl ParticlePicker for KoreanParticles {
    fn pick(&self, word: &str, particle: &str) -> String {
        let Some((with, without)) = PARTICLE_PAIRS
            .iter()
            .find(|(a, b)| *a == particle || *b == particle)
        else {
            return particle.to_string();
        };
        let sound = Self::final_sound(word);
        match sound {
            FinalSound::Vowel => without.to_string(),
            // 으로 drops its vowel after ㄹ
            FinalSound::Rieul if *with == "으로" => without.to_string(),
            FinalSound::Rieul | FinalSound::Consonant => with.to_string(),
            FinalSound::Unknown => format!("({with}){without}"),
        }
    }
}

/// Substitute `{key}` / `{key:조사}` placeholders.
///
/// Unknown keys are left in place verbatim so broken templates stay visible.
pub fn render(template: &str, vars: &[(&str, String)], picker: &dyn ParticlePicker) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let placeholder = &after[..close];
        let (key, particle) = match placeholder.split_once(':') {
            Some((key, particle)) => (key, Some(particle)),
            None => (placeholder, None),
        };
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => {
                out.push_str(value);
                if let Some(particle) = particle {
                    out.push_str(&picker.pick(value, particle));
                }
            }
            None => {
                out.push('{');
                out.push_str(placeholder);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

// === TEMPLATES ===
pub const BATTLE_START: &str = "{attacker:이} {defender:을} 향해 진군합니다. ({terrain}, {weather})";
pub const DUEL_START: &str = "{attacker:과} {defender:이} 맞붙었습니다.";
pub const STRIKE: &str = "[{turn}] {attacker:이} {defender}의 병사 {damage:을} 쓰러뜨렸습니다. (잔여 {remaining})";
pub const CRITICAL: &str = "회심의 일격! ";
pub const AVOIDED: &str = " {defender:은} 공격을 일부 피했습니다.";
pub const VOLLEY: &str = "{attacker:이} 선제 사격으로 {defender}에게 {damage}의 피해를 주었습니다.";
pub const SKILL: &str = "{unit:이} {skill:을} 발동했습니다.";
pub const INTIMIDATED: &str = "{unit:이} 위압에 눌려 사기가 꺾였습니다.";
pub const DEAD: &str = "{unit}의 부대가 전멸했습니다.";
pub const STARVED: &str = "{unit:은} 군량이 떨어져 퇴각합니다.";
pub const EXHAUSTED: &str = "{unit:은} 기력이 다해 물러납니다.";
pub const RETREAT: &str = "{unit:이} 퇴각하며 병사 {losses:을} 잃었습니다.";
pub const PURSUIT: &str = "{unit:이} 추격하여 병사 {losses:을} 더 쓰러뜨렸습니다.";
pub const CITY_ASSAULT: &str = "{attacker:이} {city} 성벽으로 진격합니다.";
pub const CITY_FALL: &str = "{city:이} 함락되었습니다!";
pub const DEFENSE_HELD: &str = "{unit:이} 성을 지켜냈습니다.";
pub const VICTORY: &str = "{side:이} 승리했습니다.";
pub const DRAW: &str = "승부가 나지 않았습니다.";

pub fn skill_label(skill: &str) -> &str {
    match skill {
        SKILL_CHARGE => "돌격",
        SKILL_FOCUS => "집중",
        SKILL_INTIMIDATE => "위압",
        SKILL_FORTIFY => "견수",
        SKILL_VOLLEY => "일제사격",
        other => other,
    }
}

/// Renders templates with an injected particle picker
#[derive(Clone)]
pub struct Narrator {
    picker: Arc<dyn ParticlePicker>,
}

impl Default for Narrator {
    fn default() -> Self {
        Self::new(Arc::new(KoreanParticles))
    }
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator").finish_non_exhaustive()
    }
}

impl Narrator {
    pub fn new(picker: Arc<dyn ParticlePicker>) -> Self {
        Self { picker }
    }

    pub fn line(&self, template: &str, vars: &[(&str, String)]) -> String {
        render(template, vars, self.picker.as_ref())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn strike(
        &self,
        turn: u32,
        attacker: &str,
        defender: &str,
        damage: u32,
        remaining: u32,
        critical: bool,
        avoided: bool,
    ) -> String {
        let mut text = String::new();
        if critical {
            text.push_str(CRITICAL);
        }
        text.push_str(&self.line(
            STRIKE,
            &[
                ("turn", turn.to_string()),
                ("attacker", attacker.to_string()),
                ("defender", defender.to_string()),
                ("damage", damage.to_string()),
                ("remaining", remaining.to_string()),
            ],
        ));
        if avoided {
            text.push_str(&self.line(AVOIDED, &[("defender", defender.to_string())]));
        }
        text
    }

    pub fn unit_event(&self, template: &str, unit: &str) -> String {
        self.line(template, &[("unit", unit.to_string())])
    }

    pub fn losses(&self, template: &str, unit: &str, losses: u32) -> String {
        self.line(template, &[("unit", unit.to_string()), ("losses", losses.to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_sound_hangul() {
        assert_eq!(KoreanParticles::final_sound("관우"), FinalSound::Vowel);
        assert_eq!(KoreanParticles::final_sound("조운"), FinalSound::Consonant);
        assert_eq!(KoreanParticles::final_sound("서울"), FinalSound::Rieul);
        assert_eq!(KoreanParticles::final_sound("Cao"), FinalSound::Unknown);
        assert_eq!(KoreanParticles::final_sound(""), FinalSound::Unknown);
    }

    #[test]
    fn test_final_sound_numbers() {
        assert_eq!(KoreanParticles::final_sound("510"), FinalSound::Consonant); // 오백십
        assert_eq!(KoreanParticles::final_sound("120"), FinalSound::Consonant); // 백이십
        assert_eq!(KoreanParticles::final_sound("2"), FinalSound::Vowel); // 이
        assert_eq!(KoreanParticles::final_sound("7"), FinalSound::Rieul); // 칠
        assert_eq!(KoreanParticles::final_sound("1000"), FinalSound::Consonant); // 천
        assert_eq!(KoreanParticles::final_sound("0"), FinalSound::Consonant); // 영
    }

    #[test]
    fn test_particle_pairs() {
        let p = KoreanParticles;
        assert_eq!(p.pick("관우", "이"), "가");
        assert_eq!(p.pick("조운", "가"), "이");
        assert_eq!(p.pick("장비", "을"), "를");
        assert_eq!(p.pick("유비", "과"), "와");
        assert_eq!(p.pick("성문", "는"), "은");
        assert_eq!(p.pick("서울", "로"), "로");
        assert_eq!(p.pick("낙양", "로"), "으로");
        assert_eq!(p.pick("형주", "으로"), "로");
        assert_eq!(p.pick("Liu", "이"), "(이)가");
        assert_eq!(p.pick("관우", "의"), "의");
    }

    #[test]
    fn test_render_substitutes_and_keeps_unknown() {
        let vars = [("name", "관우".to_string()), ("n", "510".to_string())];
        let text = render("{name:이} {n:을} 베었다 {missing}", &vars, &KoreanParticles);
        assert_eq!(text, "관우가 510을 베었다 {missing}");
    }

    #[test]
    fn test_render_unclosed_brace() {
        let text = render("앞 {name", &[("name", "x".to_string())], &KoreanParticles);
        assert_eq!(text, "앞 {name");
    }

    #[test]
    fn test_narrator_strike_line() {
        let narrator = Narrator::default();
        let line = narrator.strike(3, "조운", "장합", 510, 9490, true, false);
        assert_eq!(line, "회심의 일격! [3] 조운이 장합의 병사 510을 쓰러뜨렸습니다. (잔여 9490)");
    }

    struct Plain;

    impl ParticlePicker for Plain {
        fn pick(&self, _word: &str, particle: &str) -> String {
            format!("<{particle}>")
        }
    }

    #[test]
    fn test_custom_picker_is_used() {
        let narrator = Narrator::new(Arc::new(Plain));
        assert_eq!(narrator.unit_event(DEAD, "A"), "A의 부대가 전멸했습니다.");
        assert_eq!(narrator.unit_event(STARVED, "A"), "A<은> 군량이 떨어져 퇴각합니다.");
    }
}
