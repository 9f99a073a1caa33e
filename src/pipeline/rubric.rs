//! The fixed audit criteria ("bridges") and the prompt text for each supported language.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub title: String,
    pub description: String,
}

impl Criterion {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

#[derive(Debug, Error)]
#[error("unknown locale {0:?}, expected en or es")]
pub struct UnknownLocale(String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "es" | "spanish" | "español" => Ok(Locale::Es),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Es => f.write_str("es"),
        }
    }
}

/// All user-visible and model-visible wording for one locale.
#[derive(Debug)]
pub struct PromptText {
    pub criteria: [(&'static str, &'static str); 8],
    pub auditor_system: &'static str,
    pub evaluate_lead: &'static str,
    pub context_heading: &'static str,
    pub system_type_label: &'static str,
    pub criticality_label: &'static str,
    pub user_profile_label: &'static str,
    pub environment_label: &'static str,
    pub instructions: &'static str,
    pub reply_format: &'static str,
    pub synthesis_system: &'static str,
    pub synthesis_lead: &'static str,
    pub synthesis_format: &'static str,
    pub no_scores: &'static str,
}

static EN: PromptText = PromptText {
    criteria: [
        ("BRIDGE 01 – ORIENT", "User orientation and visibility of system status."),
        ("BRIDGE 02 – FOCUS", "Visual hierarchy and signal versus noise."),
        ("BRIDGE 03 – WARN", "Clarity and priority of alarms and warnings."),
        ("BRIDGE 04 – UNDERSTAND", "Cause–effect relationships and operating context."),
        ("BRIDGE 05 – PROJECT", "Trends and anticipation of future state."),
        ("BRIDGE 06 – GUIDE", "Guided sequences and error recovery."),
        ("BRIDGE 07 – ACCESS", "Digital ergonomics and accessibility of controls."),
        ("BRIDGE 08 – LEARN", "Use of history and operator learning."),
    ],
    auditor_system: "You are a very demanding industrial UX auditor. \
        You evaluate HMI interfaces against professional standards. \
        Use a strict scale and be critical.",
    evaluate_lead: "Evaluate the HMI interface against",
    context_heading: "Operating conditions:",
    system_type_label: "System type",
    criticality_label: "Criticality level",
    user_profile_label: "User profile",
    environment_label: "Operating environment",
    instructions: "Instructions:\n\
        - Adjust your strictness to the criticality and the environment.\n\
        - If the system is Safety or Emergency, be especially strict.\n\
        - If the environment is High pressure or Emergency, penalize ambiguity.\n\
        - If the user is new, give particular weight to clarity and guidance.",
    reply_format: "Mandatory format:\n\
        SCORE: X/10\n\
        SUMMARY: a single clear sentence based on concrete visible elements \
        of the image. Avoid generic phrases.",
    synthesis_system: "You are an industrial UX expert who summarizes evaluations \
        for a non-expert audience in a clear, critical and direct way.",
    synthesis_lead: "Based on the following results per bridge:",
    synthesis_format: "Produce a FINAL summary with this exact structure:\n\n\
        KEY OBSERVATIONS:\n\
        - bullet 1\n- bullet 2\n- bullet 3\n\n\
        OPERATIONAL IMPACT:\n\
        - bullet 1\n- bullet 2\n- bullet 3\n\n\
        IMPROVEMENT OPPORTUNITIES:\n\
        - bullet 1\n- bullet 2\n- bullet 3\n\n\
        Clear, direct, non-technical language. At most 3 bullets per section.",
    no_scores: "No scores could be computed.",
};

static ES: PromptText = PromptText {
    criteria: [
        ("PUENTE 01 – ORIENTAR", "Orientación del usuario y visibilidad del estado del sistema."),
        ("PUENTE 02 – ENFOCAR", "Jerarquía visual y señal frente a ruido."),
        ("PUENTE 03 – ADVERTIR", "Claridad y prioridad de alertas y avisos."),
        ("PUENTE 04 – ENTENDER", "Relaciones causa–efecto y contexto operativo."),
        ("PUENTE 05 – PROYECTAR", "Tendencias y anticipación del estado futuro."),
        ("PUENTE 06 – GUIAR", "Secuencias guiadas y recuperación ante errores."),
        ("PUENTE 07 – ACCEDER", "Ergonomía digital y accesibilidad de controles."),
        ("PUENTE 08 – APRENDER", "Uso del histórico y aprendizaje del operador."),
    ],
    auditor_system: "Eres un auditor UX industrial muy exigente. \
        Evalúas interfaces HMI comparándolas con estándares profesionales. \
        Utiliza una escala estricta y sé crítico.",
    evaluate_lead: "Evalúa la interfaz HMI según",
    context_heading: "Condiciones operativas:",
    system_type_label: "Tipo de sistema",
    criticality_label: "Nivel de criticidad",
    user_profile_label: "Perfil del usuario",
    environment_label: "Entorno operativo",
    instructions: "Instrucciones:\n\
        - Ajusta la exigencia según criticidad y entorno.\n\
        - Si el sistema es Seguridad o Emergencia, sé especialmente estricto.\n\
        - Si el entorno es Alta presión o Emergencia, penaliza ambigüedades.\n\
        - Si el usuario es nuevo, valora especialmente claridad y guiado.",
    reply_format: "Formato obligatorio:\n\
        PUNTUACIÓN: X/10\n\
        RESUMEN: una única frase clara basada en elementos visibles concretos \
        de la imagen. Evita frases genéricas.",
    synthesis_system: "Eres un experto en UX industrial que sintetiza evaluaciones \
        para público no experto de forma clara, crítica y directa.",
    synthesis_lead: "A partir de los siguientes resultados por puente:",
    synthesis_format: "Genera un resumen FINAL con esta estructura exacta:\n\n\
        OBSERVACIONES CLAVE:\n\
        - bullet 1\n- bullet 2\n- bullet 3\n\n\
        IMPACTO OPERATIVO:\n\
        - bullet 1\n- bullet 2\n- bullet 3\n\n\
        OPORTUNIDADES DE MEJORA:\n\
        - bullet 1\n- bullet 2\n- bullet 3\n\n\
        Lenguaje claro, directo y no técnico. Máximo 3 bullets por sección.",
    no_scores: "No se pudieron calcular puntuaciones.",
};

impl Locale {
    pub fn text(self) -> &'static PromptText {
        match self {
            Locale::En => &EN,
            Locale::Es => &ES,
        }
    }
}

/// The ordered criteria plus the wording used to evaluate them. Built once at startup.
#[derive(Debug, Clone)]
pub struct Rubric {
    pub locale: Locale,
    pub criteria: Vec<Criterion>,
}

impl Rubric {
    /// The eight standard bridges in their fixed order.
    pub fn standard(locale: Locale) -> Self {
        let criteria = locale
            .text()
            .criteria
            .iter()
            .map(|(title, description)| Criterion::new(title, description))
            .collect();
        Self { locale, criteria }
    }

    pub fn text(&self) -> &'static PromptText {
        self.locale.text()
    }
}
