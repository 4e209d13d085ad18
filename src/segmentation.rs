use crate::foundation::{
    core::{FrameSize, MaskPlane},
    error::{MatteError, MatteResult},
};

/// How a segmentation model encodes "person".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPolarity {
    /// Multiclass models: category `> 0` is a person class.
    #[default]
    Multiclass,
    /// Binary selfie models: both planes come out with the opposite sign.
    Binary,
}

impl ModelPolarity {
    pub fn is_inverted(self) -> bool {
        matches!(self, Self::Binary)
    }
}

/// One inference result from the segmentation model.
///
/// `category` holds the winning class per pixel (0 = background). `confidence` holds the score
/// of the background class; the state update turns it into a person score for person pixels.
/// Both planes share a size, which may be smaller than the video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationMasks {
    category: MaskPlane,
    confidence: MaskPlane,
    polarity: ModelPolarity,
}

impl SegmentationMasks {
    pub fn new(
        category: MaskPlane,
        confidence: MaskPlane,
        polarity: ModelPolarity,
    ) -> MatteResult<Self> {
        if category.size() != confidence.size() {
            return Err(MatteError::input(format!(
                "category plane is {}x{} but confidence plane is {}x{}",
                category.size().width,
                category.size().height,
                confidence.size().width,
                confidence.size().height
            )));
        }
        if category.size().is_empty() {
            return Err(MatteError::input("segmentation planes must be non-empty"));
        }
        Ok(Self {
            category,
            confidence,
            polarity,
        })
    }

    pub fn from_f32(
        width: u32,
        height: u32,
        category: Vec<f32>,
        confidence: Vec<f32>,
        polarity: ModelPolarity,
    ) -> MatteResult<Self> {
        Self::new(
            MaskPlane::new(width, height, category)?,
            MaskPlane::new(width, height, confidence)?,
            polarity,
        )
    }

    /// Build from 8-bit grayscale planes, mapping `0..=255` onto `0..=1`.
    pub fn from_gray8(
        width: u32,
        height: u32,
        category: &[u8],
        confidence: &[u8],
        polarity: ModelPolarity,
    ) -> MatteResult<Self> {
        Self::new(
            MaskPlane::from_gray8(width, height, category)?,
            MaskPlane::from_gray8(width, height, confidence)?,
            polarity,
        )
    }

    /// Uniform planes, handy for synthetic signals.
    pub fn uniform(
        size: FrameSize,
        category: f32,
        confidence: f32,
        polarity: ModelPolarity,
    ) -> MatteResult<Self> {
        Self::new(
            MaskPlane::filled(size, category),
            MaskPlane::filled(size, confidence),
            polarity,
        )
    }

    pub fn size(&self) -> FrameSize {
        self.category.size()
    }

    pub fn category(&self) -> &MaskPlane {
        &self.category
    }

    pub fn confidence(&self) -> &MaskPlane {
        &self.confidence
    }

    pub fn polarity(&self) -> ModelPolarity {
        self.polarity
    }
}
