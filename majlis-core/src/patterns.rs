//! Static message-pattern tables.
//!
//! Everything in this module is immutable configuration data. Keyword
//! matching lowercase-folds both the keyword and the trigger before a
//! substring test; Arabic has no case, so this only affects Latin words
//! such as `api` or `bug`.

use serde::Serialize;

use crate::models::Personality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessagePattern {
    pub triggers: &'static [&'static str],
    pub responses: &'static [&'static str],
    pub delay_ms: u64,
    pub priority: u32,
}

impl MessagePattern {
    /// Number of this pattern's keywords found in an already-normalized trigger.
    pub fn match_count(&self, normalized_trigger: &str) -> u32 {
        self.triggers
            .iter()
            .filter(|keyword| normalized_trigger.contains(&normalize(keyword)))
            .count() as u32
    }

    pub fn matches(&self, normalized_trigger: &str) -> bool {
        self.match_count(normalized_trigger) > 0
    }
}

/// The single normalization rule applied before every keyword test.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

const PROFESSIONAL_PATTERNS: &[MessagePattern] = &[
    MessagePattern {
        triggers: &["اجتماع", "جدول", "موعد"],
        responses: &[
            "أقترح أن نلتزم بجدول الأعمال حتى ننهي الاجتماع في وقته.",
            "هل يمكننا تحديد موعد المتابعة قبل أن ننهي؟",
            "سأرسل ملخص الاجتماع بعد انتهائنا مباشرة.",
        ],
        delay_ms: 2500,
        priority: 2,
    },
    MessagePattern {
        triggers: &["تقرير", "نتائج", "أرقام"],
        responses: &[
            "الأرقام الأخيرة تبدو مشجعة، لكن أحتاج إلى مراجعة التفاصيل.",
            "سأجهز تقريراً مفصلاً عن النتائج قبل نهاية الأسبوع.",
            "من المهم أن نقارن هذه النتائج بالربع السابق.",
        ],
        delay_ms: 3000,
        priority: 3,
    },
    MessagePattern {
        triggers: &["عميل", "عملاء", "شريك"],
        responses: &[
            "رضا العملاء يجب أن يبقى أولويتنا الأولى.",
            "تواصلت مع الشريك أمس وهو ينتظر ردنا الرسمي.",
        ],
        delay_ms: 2800,
        priority: 2,
    },
];

const PROFESSIONAL_GENERIC: &[&str] = &[
    "نقطة مهمة، دعونا نوثقها في المحضر.",
    "أتفق مع ما قيل، ولدي إضافة بسيطة لاحقاً.",
    "هل لدينا بيانات تدعم هذا الاتجاه؟",
    "لننتقل إلى البند التالي إذا لم تكن هناك أسئلة.",
];

const FRIENDLY_PATTERNS: &[MessagePattern] = &[
    MessagePattern {
        triggers: &["مرحبا", "أهلا", "السلام"],
        responses: &[
            "أهلاً وسهلاً! سعيد برؤيتكم جميعاً 😊",
            "وعليكم السلام! كيف حال الجميع اليوم؟",
            "مرحباً! يوم جميل للعمل معاً 🌞",
        ],
        delay_ms: 1500,
        priority: 3,
    },
    MessagePattern {
        triggers: &["شكرا", "ممتاز", "رائع"],
        responses: &[
            "العفو! هذا واجبنا 🙏",
            "فعلاً عمل رائع من الفريق كله 👏",
            "يسعدني أن الأمور تسير بشكل جيد!",
        ],
        delay_ms: 2000,
        priority: 2,
    },
    MessagePattern {
        triggers: &["كيف حالك", "أخبارك", "عطلة"],
        responses: &[
            "الحمد لله بخير، وأنتم؟",
            "أخباري جيدة، كانت عطلة نهاية أسبوع هادئة ☕",
        ],
        delay_ms: 1800,
        priority: 2,
    },
];

const FRIENDLY_GENERIC: &[&str] = &[
    "كلام جميل! 😄",
    "أحب هذه الروح في الفريق 💪",
    "أنا معكم في هذا تماماً!",
    "فكرة لطيفة، لنجربها 👍",
];

const TECHNICAL_PATTERNS: &[MessagePattern] = &[
    MessagePattern {
        triggers: &["كود", "برمجة", "خطأ", "bug"],
        responses: &[
            "يمكنني مراجعة الكود بعد الاجتماع وإرسال الملاحظات.",
            "أعتقد أن الخطأ في طبقة التحقق من المدخلات، سأتحقق منه.",
            "لنكتب اختبارات تغطي هذه الحالة قبل أي تعديل.",
        ],
        delay_ms: 3500,
        priority: 3,
    },
    MessagePattern {
        triggers: &["خادم", "قاعدة بيانات", "api", "أداء"],
        responses: &[
            "الخادم يعمل بشكل طبيعي، لكن زمن الاستجابة ارتفع قليلاً.",
            "يمكننا إضافة فهرس على قاعدة البيانات لتحسين الأداء.",
            "واجهة الـ API الجديدة جاهزة للاختبار.",
        ],
        delay_ms: 3200,
        priority: 3,
    },
    MessagePattern {
        triggers: &["تحديث", "نشر", "إصدار"],
        responses: &[
            "الإصدار القادم جاهز للنشر بعد اجتياز الاختبارات.",
            "أفضل أن ننشر التحديث تدريجياً لتقليل المخاطر.",
        ],
        delay_ms: 3000,
        priority: 2,
    },
];

const TECHNICAL_GENERIC: &[&str] = &[
    "من الناحية التقنية هذا ممكن، لكن يحتاج بعض الوقت.",
    "سأتحقق من السجلات وأعود إليكم.",
    "لنوثق هذا في تذكرة حتى لا ننساه.",
    "هل جربنا هذا في بيئة الاختبار أولاً؟",
];

const CREATIVE_PATTERNS: &[MessagePattern] = &[
    MessagePattern {
        triggers: &["فكرة", "أفكار", "إبداع"],
        responses: &[
            "لدي فكرة مختلفة قليلاً، ماذا لو قلبنا الترتيب؟ 💡",
            "لنجلس جلسة عصف ذهني قصيرة حول هذا ✨",
            "أحب هذه الفكرة! يمكننا تطويرها أكثر 🎨",
        ],
        delay_ms: 2500,
        priority: 3,
    },
    MessagePattern {
        triggers: &["تصميم", "شعار", "ألوان"],
        responses: &[
            "جهزت نموذجاً أولياً للتصميم، سأشاركه الآن 🎨",
            "أقترح ألواناً أهدأ حتى تبرز الرسالة الأساسية.",
        ],
        delay_ms: 2800,
        priority: 3,
    },
    MessagePattern {
        triggers: &["عرض", "قصة", "حملة"],
        responses: &[
            "يمكننا رواية القصة من منظور المستخدم 📖",
            "العرض يحتاج إلى بداية أقوى تجذب الانتباه.",
        ],
        delay_ms: 2600,
        priority: 2,
    },
];

const CREATIVE_GENERIC: &[&str] = &[
    "هذا يلهمني بفكرة جديدة! ✨",
    "ماذا لو نظرنا للأمر من زاوية مختلفة؟",
    "أرى فرصة جميلة هنا 🌈",
    "لنجعلها تجربة لا تُنسى للمستخدم!",
];

const MANAGER_PATTERNS: &[MessagePattern] = &[
    MessagePattern {
        triggers: &["مشروع", "خطة", "أهداف"],
        responses: &[
            "لنحدد الأهداف بوضوح ونوزع المهام على الفريق.",
            "الخطة تسير جيداً، لكن نحتاج إلى متابعة أسبوعية.",
            "أريد تحديثاً عن حالة المشروع من كل فريق.",
        ],
        delay_ms: 2500,
        priority: 3,
    },
    MessagePattern {
        triggers: &["ميزانية", "تكلفة", "موارد"],
        responses: &[
            "الميزانية محدودة هذا الربع، لنرتب الأولويات.",
            "سأطلب موارد إضافية إذا احتجنا إليها.",
        ],
        delay_ms: 3000,
        priority: 3,
    },
    MessagePattern {
        triggers: &["موعد نهائي", "تسليم", "تأخير"],
        responses: &[
            "الموعد النهائي ثابت، فلنبلغ مبكراً عن أي تأخير.",
            "ما الذي نحتاجه للتسليم في الوقت المحدد؟",
        ],
        delay_ms: 2700,
        priority: 2,
    },
];

const MANAGER_GENERIC: &[&str] = &[
    "جيد، من المسؤول عن هذه النقطة؟",
    "لنضع موعداً واضحاً لهذا البند.",
    "أقدر جهود الجميع، لنستمر بنفس الوتيرة.",
    "سنراجع هذا في اجتماع المتابعة.",
];

/// Keyword patterns for a personality, in declaration order.
pub fn patterns_for(personality: Personality) -> &'static [MessagePattern] {
    match personality {
        Personality::Professional => PROFESSIONAL_PATTERNS,
        Personality::Friendly => FRIENDLY_PATTERNS,
        Personality::Technical => TECHNICAL_PATTERNS,
        Personality::Creative => CREATIVE_PATTERNS,
        Personality::Manager => MANAGER_PATTERNS,
    }
}

/// Fallback lines used when no keyword pattern matches.
pub fn generic_responses(personality: Personality) -> &'static [&'static str] {
    match personality {
        Personality::Professional => PROFESSIONAL_GENERIC,
        Personality::Friendly => FRIENDLY_GENERIC,
        Personality::Technical => TECHNICAL_GENERIC,
        Personality::Creative => CREATIVE_GENERIC,
        Personality::Manager => MANAGER_GENERIC,
    }
}

pub const WELCOME_MESSAGES: &[&str] = &[
    "أهلاً بالجميع! سعيد بانضمامي إلى الاجتماع 👋",
    "مساء الخير، جاهز للبدء متى أردتم.",
    "مرحباً! الصوت والصورة واضحان عندي.",
    "السلام عليكم، تأخرت دقيقة، أعتذر 🙏",
    "أهلاً، لدي بعض النقاط أود مشاركتها لاحقاً.",
    "مرحباً بالجميع، يوم موفق لنا جميعاً ✨",
];

/// Ambient topics fired by the spontaneous ticker. Each one carries at
/// least one keyword so the selector has something to rank on.
pub const SPONTANEOUS_TOPICS: &[&str] = &[
    "ما رأيكم في تقرير الأداء الأخير؟",
    "هل انتهينا من مراجعة الكود الجديد؟",
    "عندي فكرة لتصميم الصفحة الرئيسية",
    "متى الموعد النهائي لتسليم المشروع؟",
    "كيف حالك اليوم؟ أخبارك؟",
    "هل نحتاج إلى موارد إضافية لهذه الخطة؟",
    "العملاء طلبوا اجتماعاً الأسبوع القادم",
    "متى نشر الإصدار الجديد على الخادم؟",
];

/// Name/avatar inventory for generated pools. `generate` clamps to its length.
pub const PARTICIPANT_IDENTITIES: &[(&str, &str)] = &[
    ("أحمد", "👨‍💼"),
    ("فاطمة", "👩‍💻"),
    ("محمد", "👨‍💻"),
    ("نور", "👩‍🎨"),
    ("خالد", "🧑‍💼"),
    ("ليلى", "👩‍🏫"),
    ("يوسف", "👨‍🔧"),
    ("سارة", "👩‍🔬"),
    ("عمر", "🧑‍🎨"),
    ("مريم", "👩‍⚕️"),
    ("حسن", "👨‍🏫"),
    ("هدى", "👩‍💼"),
];

pub const GRATITUDE_KEYWORDS: &[&str] = &["شكرا", "شكراً"];
pub const PROJECT_KEYWORDS: &[&str] = &["مشروع", "عمل"];
pub const GRATITUDE_CLAUSE: &str = "وشكراً لكم على التعاون 🙏";
pub const PLANNING_CLAUSE: &str = "لنضع خطة واضحة للخطوات القادمة.";
